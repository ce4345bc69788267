//! Simulation configuration and validation.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use pixsim_core::{Configuration, DetectorId};
use pixsim_detector::DetectorModel;
use pixsim_field::DEFAULT_MAX_FIELD_FILE_BYTES;
use pixsim_module::Module;

use crate::error::SetupError;

/// A detector of the setup.
#[derive(Clone, Debug)]
pub struct DetectorConfig {
    /// Unique detector name.
    pub name: DetectorId,
    /// Geometry, shared with every module bound to the detector.
    pub model: Arc<DetectorModel>,
}

/// A module instance with its configuration section.
pub struct ModuleEntry {
    /// The module.
    pub module: Box<dyn Module>,
    /// Its configuration.
    pub config: Configuration,
}

impl fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("module", &self.module.name())
            .field("detector", &self.module.detector())
            .field("config", &self.config)
            .finish()
    }
}

/// Everything needed to construct a [`Simulation`](crate::Simulation).
///
/// Modules are initialized in the order they are added; the execution
/// order for events is derived from their message declarations.
#[derive(Debug)]
pub struct SimulationConfig {
    /// Detectors of the setup.
    pub detectors: Vec<DetectorConfig>,
    /// Module instances.
    pub modules: Vec<ModuleEntry>,
    /// Memory ceiling for a single field file, in bytes.
    pub max_field_file_bytes: u64,
}

impl SimulationConfig {
    /// An empty configuration with the default memory ceiling.
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
            modules: Vec::new(),
            max_field_file_bytes: DEFAULT_MAX_FIELD_FILE_BYTES,
        }
    }

    /// Add a detector.
    pub fn with_detector(mut self, name: impl Into<DetectorId>, model: Arc<DetectorModel>) -> Self {
        self.detectors.push(DetectorConfig {
            name: name.into(),
            model,
        });
        self
    }

    /// Add a module instance.
    pub fn with_module(mut self, module: impl Module, config: Configuration) -> Self {
        self.modules.push(ModuleEntry {
            module: Box::new(module),
            config,
        });
        self
    }

    /// Validate structural invariants.
    ///
    /// Called automatically by `Simulation::new()`.
    pub fn validate(&self) -> Result<(), SetupError> {
        // 1. At least one module.
        if self.modules.is_empty() {
            return Err(SetupError::NoModules);
        }
        // 2. Module count must fit in u32 (ModuleId is u32).
        if u32::try_from(self.modules.len()).is_err() {
            return Err(SetupError::ModuleCountOverflow {
                value: self.modules.len(),
            });
        }
        // 3. Unique detector names.
        let mut names = HashSet::new();
        for det in &self.detectors {
            if !names.insert(&det.name) {
                return Err(SetupError::DuplicateDetector {
                    name: det.name.clone(),
                });
            }
        }
        // 4. Every bound detector exists.
        for entry in &self.modules {
            if let Some(detector) = entry.module.detector() {
                if !names.contains(detector) {
                    return Err(SetupError::UnknownDetector {
                        module: entry.module.name().to_string(),
                        detector: detector.clone(),
                    });
                }
            }
        }
        // 5. Non-zero memory ceiling.
        if self.max_field_file_bytes == 0 {
            return Err(SetupError::InvalidMemoryCeiling);
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
