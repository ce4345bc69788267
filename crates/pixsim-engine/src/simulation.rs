//! The [`Simulation`] driver.

use std::time::Instant;

use indexmap::IndexMap;
use pixsim_core::{Configuration, DetectorId, EventNumber, ModuleId};
use pixsim_detector::Detector;
use pixsim_field::FieldCache;
use pixsim_messenger::Messenger;
use pixsim_module::{
    execution_order, FinalizeContext, InitContext, Module, ModuleError, RunContext,
};

use crate::config::SimulationConfig;
use crate::error::{EventError, FinalizeError, SetupError};
use crate::metrics::EventMetrics;

struct ModuleSlot {
    module: Box<dyn Module>,
    config: Configuration,
    detector: Option<DetectorId>,
}

impl ModuleSlot {
    fn event_error(&self, event: EventNumber, source: ModuleError) -> EventError {
        EventError {
            event,
            module: self.module.name().to_string(),
            detector: self.detector.clone(),
            source,
        }
    }
}

/// Outcome of [`Simulation::run`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Events that ran to completion.
    pub events_completed: u64,
    /// Events abandoned after a recoverable error.
    pub failed_events: Vec<EventError>,
    /// The non-recoverable error that stopped the run, if any.
    pub aborted: Option<EventError>,
}

/// A fully initialized simulation pipeline.
///
/// # Lifecycle
///
/// 1. [`Simulation::new`] validates the configuration, creates the
///    detectors and initializes every module in configuration order. Any
///    failure is returned as a [`SetupError`].
/// 2. [`Simulation::run_event`] runs every module once, in dependency
///    order. A failing module abandons the event; the bus is reset
///    before the next event either way.
/// 3. [`Simulation::finalize`] calls every module's `finalize` once.
pub struct Simulation {
    modules: Vec<ModuleSlot>,
    order: Vec<ModuleId>,
    detectors: IndexMap<DetectorId, Detector>,
    messenger: Messenger,
    fields: FieldCache,
    next_event: EventNumber,
    events_completed: u64,
    last_metrics: EventMetrics,
    finalized: bool,
}

impl Simulation {
    /// Build and initialize the pipeline.
    pub fn new(config: SimulationConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let detectors: IndexMap<DetectorId, Detector> = config
            .detectors
            .into_iter()
            .map(|d| (d.name.clone(), Detector::new(d.name, d.model)))
            .collect();

        let modules: Vec<ModuleSlot> = config
            .modules
            .into_iter()
            .map(|entry| ModuleSlot {
                detector: entry.module.detector().cloned(),
                module: entry.module,
                config: entry.config,
            })
            .collect();

        let mut sim = Self {
            modules,
            order: Vec::new(),
            detectors,
            messenger: Messenger::new(),
            fields: FieldCache::new(config.max_field_file_bytes),
            next_event: EventNumber(1),
            events_completed: 0,
            last_metrics: EventMetrics::default(),
            finalized: false,
        };
        sim.initialize()?;
        sim.order = execution_order(sim.modules.len(), &sim.messenger)?;

        log::info!(
            "Initialized {} modules on {} detectors",
            sim.modules.len(),
            sim.detectors.len()
        );
        log::debug!(
            "Execution order: {}",
            sim.order
                .iter()
                .map(|id| sim.modules[id.0 as usize].module.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(sim)
    }

    fn initialize(&mut self) -> Result<(), SetupError> {
        for (index, slot) in self.modules.iter_mut().enumerate() {
            let detector = match &slot.detector {
                Some(id) => Some(self.detectors.get_mut(id).ok_or_else(|| {
                    SetupError::UnknownDetector {
                        module: slot.module.name().to_string(),
                        detector: id.clone(),
                    }
                })?),
                None => None,
            };
            let mut ctx = InitContext::new(
                ModuleId(index as u32),
                &slot.config,
                detector,
                &mut self.messenger,
                &self.fields,
            );
            slot.module
                .initialize(&mut ctx)
                .map_err(|source| SetupError::Initialize {
                    module: slot.module.name().to_string(),
                    detector: slot.detector.clone(),
                    source,
                })?;
            log::trace!("Initialized module {}", slot.module.name());
        }
        Ok(())
    }

    // ── Event execution ─────────────────────────────────────────

    /// Run every module once for the next event.
    ///
    /// The event number advances whether or not the event succeeds.
    pub fn run_event(&mut self) -> Result<&EventMetrics, EventError> {
        let event = self.next_event;
        self.next_event = event.next();

        let start = Instant::now();
        let mut metrics = EventMetrics::default();
        self.messenger.begin_event(event);
        log::debug!("Running event {event}");

        let result = self.run_modules(event, &mut metrics);
        metrics.messages_dispatched = self.messenger.end_event();
        metrics.total_us = start.elapsed().as_micros() as u64;
        self.last_metrics = metrics;

        match result {
            Ok(()) => {
                self.events_completed += 1;
                Ok(&self.last_metrics)
            }
            Err(e) => {
                if e.is_recoverable() {
                    log::warn!("Abandoned {e}");
                } else {
                    log::error!("{e}");
                }
                Err(e)
            }
        }
    }

    fn run_modules(
        &mut self,
        event: EventNumber,
        metrics: &mut EventMetrics,
    ) -> Result<(), EventError> {
        for &id in &self.order {
            let slot = &mut self.modules[id.0 as usize];
            let detector = match &slot.detector {
                Some(d) => Some(
                    self.detectors
                        .get(d)
                        .ok_or_else(|| slot.event_error(event, ModuleError::MissingDetector))?,
                ),
                None => None,
            };

            let module_start = Instant::now();
            let mut ctx = RunContext::new(id, event, detector, &mut self.messenger);
            let outcome = slot.module.run(&mut ctx);
            metrics.module_us.push((
                slot.module.name().to_string(),
                module_start.elapsed().as_micros() as u64,
            ));
            outcome.map_err(|source| slot.event_error(event, source))?;
        }
        Ok(())
    }

    /// Run up to `events` events.
    ///
    /// Events that fail with a recoverable error are recorded and
    /// skipped. A non-recoverable error stops the run.
    pub fn run(&mut self, events: u64) -> RunSummary {
        let mut summary = RunSummary::default();
        for _ in 0..events {
            match self.run_event() {
                Ok(_) => summary.events_completed += 1,
                Err(e) if e.is_recoverable() => summary.failed_events.push(e),
                Err(e) => {
                    summary.aborted = Some(e);
                    break;
                }
            }
        }
        log::info!(
            "Finished {} events ({} failed)",
            summary.events_completed,
            summary.failed_events.len()
        );
        summary
    }

    /// Call every module's `finalize`, in execution order.
    ///
    /// Every module is finalized even if an earlier one fails; the first
    /// failure is returned. Calling this more than once does nothing.
    pub fn finalize(&mut self) -> Result<(), FinalizeError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        let mut first_error = None;
        for &id in &self.order {
            let slot = &mut self.modules[id.0 as usize];
            let detector = slot.detector.as_ref().and_then(|d| self.detectors.get(d));
            let mut ctx = FinalizeContext::new(id, detector, self.events_completed);
            if let Err(source) = slot.module.finalize(&mut ctx) {
                let err = FinalizeError {
                    module: slot.module.name().to_string(),
                    detector: slot.detector.clone(),
                    source,
                };
                log::error!("{err}");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Module IDs in execution order.
    pub fn execution_order(&self) -> &[ModuleId] {
        &self.order
    }

    /// Type name of a module.
    pub fn module_name(&self, id: ModuleId) -> Option<&str> {
        self.modules.get(id.0 as usize).map(|s| s.module.name())
    }

    /// Number of module instances.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// A detector by name.
    pub fn detector(&self, name: &DetectorId) -> Option<&Detector> {
        self.detectors.get(name)
    }

    /// Shared field tables.
    pub fn field_cache(&self) -> &FieldCache {
        &self.fields
    }

    /// Number of the event the next `run_event` will process.
    pub fn next_event(&self) -> EventNumber {
        self.next_event
    }

    /// Events that ran to completion so far.
    pub fn events_completed(&self) -> u64 {
        self.events_completed
    }

    /// Metrics of the most recent event.
    pub fn last_metrics(&self) -> &EventMetrics {
        &self.last_metrics
    }
}
