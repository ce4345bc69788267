//! Per-event performance metrics.

/// Timing and message counts collected during a single event.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventMetrics {
    /// Wall-clock time for the whole event.
    pub total_us: u64,
    /// Per-module execution times in execution order: `(name, microseconds)`.
    pub module_us: Vec<(String, u64)>,
    /// Number of messages dispatched during the event.
    pub messages_dispatched: usize,
}

impl EventMetrics {
    /// Execution time of the module with `name`, summed over instances.
    pub fn module_time_us(&self, name: &str) -> u64 {
        self.module_us
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, us)| us)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = EventMetrics::default();
        assert_eq!(m.total_us, 0);
        assert!(m.module_us.is_empty());
        assert_eq!(m.messages_dispatched, 0);
    }

    #[test]
    fn module_time_sums_instances() {
        let m = EventMetrics {
            total_us: 30,
            module_us: vec![
                ("Deposition".into(), 10),
                ("Transfer".into(), 5),
                ("Deposition".into(), 12),
            ],
            messages_dispatched: 3,
        };
        assert_eq!(m.module_time_us("Deposition"), 22);
        assert_eq!(m.module_time_us("Missing"), 0);
    }
}
