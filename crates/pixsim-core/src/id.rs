//! Strongly-typed identifiers for detectors, module instances and events.

use std::fmt;
use std::sync::Arc;

/// Identifies a detector instance by its unique name.
///
/// Names come from the geometry description and are shared by every
/// module bound to the detector, so the string is reference-counted and
/// cloning is cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetectorId(Arc<str>);

impl DetectorId {
    /// Create a detector identifier from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The detector name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DetectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DetectorId {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

impl From<String> for DetectorId {
    fn from(v: String) -> Self {
        Self(Arc::from(v))
    }
}

/// Identifies a module instance within a simulation.
///
/// Module instances are registered at setup and assigned sequential IDs.
/// `ModuleId(n)` corresponds to the n-th module in the simulation
/// configuration, independent of the execution order computed later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ModuleId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing event counter.
///
/// The first simulated event is number 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventNumber(pub u64);

impl EventNumber {
    /// The event following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EventNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EventNumber {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_ids_compare_by_name() {
        let a = DetectorId::new("dut");
        let b = DetectorId::from("dut".to_string());
        assert_eq!(a, b);
        assert_ne!(a, DetectorId::new("telescope0"));
        assert_eq!(a.to_string(), "dut");
    }

    #[test]
    fn event_numbers_advance() {
        assert_eq!(EventNumber(1).next(), EventNumber(2));
        assert!(EventNumber(3) > EventNumber(2));
    }
}
