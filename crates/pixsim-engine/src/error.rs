//! Errors raised by the simulation driver.

use std::error::Error;
use std::fmt;

use pixsim_core::{DetectorId, EventNumber};
use pixsim_module::{ModuleError, OrderError};

/// Failure while building a [`Simulation`](crate::Simulation).
///
/// Every variant aborts the run before any event is processed.
#[derive(Debug, PartialEq)]
pub enum SetupError {
    /// No modules registered.
    NoModules,
    /// Two detectors share a name.
    DuplicateDetector {
        /// The repeated name.
        name: DetectorId,
    },
    /// A module is bound to a detector that is not configured.
    UnknownDetector {
        /// Module type name.
        module: String,
        /// The missing detector.
        detector: DetectorId,
    },
    /// More modules than fit in a `ModuleId`.
    ModuleCountOverflow {
        /// The number of modules.
        value: usize,
    },
    /// The field file memory ceiling is zero.
    InvalidMemoryCeiling,
    /// A module failed to initialize.
    Initialize {
        /// Module type name.
        module: String,
        /// Detector the module is bound to.
        detector: Option<DetectorId>,
        /// The underlying failure.
        source: ModuleError,
    },
    /// The declared dependencies cannot be ordered.
    Order(OrderError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoModules => write!(f, "no modules registered"),
            Self::DuplicateDetector { name } => write!(f, "detector '{name}' defined twice"),
            Self::UnknownDetector { module, detector } => {
                write!(f, "module {module} is bound to unknown detector '{detector}'")
            }
            Self::ModuleCountOverflow { value } => {
                write!(f, "module count {value} exceeds u32::MAX")
            }
            Self::InvalidMemoryCeiling => write!(f, "max_field_file_bytes must be non-zero"),
            Self::Initialize {
                module,
                detector,
                source,
            } => {
                write!(f, "module {module}{} failed to initialize: {source}", on(detector))
            }
            Self::Order(e) => write!(f, "pipeline order: {e}"),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Initialize { source, .. } => Some(source),
            Self::Order(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OrderError> for SetupError {
    fn from(e: OrderError) -> Self {
        Self::Order(e)
    }
}

/// Failure of one module in one event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventError {
    /// The event that was abandoned.
    pub event: EventNumber,
    /// Module type name.
    pub module: String,
    /// Detector the module is bound to.
    pub detector: Option<DetectorId>,
    /// The underlying failure.
    pub source: ModuleError,
}

impl EventError {
    /// Whether later events can still run.
    pub fn is_recoverable(&self) -> bool {
        self.source.is_recoverable()
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event {}: module {}{} failed: {}",
            self.event,
            self.module,
            on(&self.detector),
            self.source
        )
    }
}

impl Error for EventError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Failure of a module's `finalize`.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalizeError {
    /// Module type name.
    pub module: String,
    /// Detector the module is bound to.
    pub detector: Option<DetectorId>,
    /// The underlying failure.
    pub source: ModuleError,
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "module {}{} failed to finalize: {}",
            self.module,
            on(&self.detector),
            self.source
        )
    }
}

impl Error for FinalizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

fn on(detector: &Option<DetectorId>) -> String {
    match detector {
        Some(d) => format!(" on '{d}'"),
        None => String::new(),
    }
}
