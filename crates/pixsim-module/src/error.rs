//! Errors raised by module code.

use std::error::Error;
use std::fmt;

use pixsim_core::ConfigError;
use pixsim_detector::FieldQueryError;
use pixsim_field::FieldFileError;
use pixsim_messenger::MessengerError;

/// Failure inside a module's `initialize`, `run` or `finalize`.
///
/// Any error from `initialize` aborts the whole run. During `run`, the
/// engine abandons the current event and continues with the next one
/// unless [`ModuleError::is_recoverable`] is `false`.
#[derive(Clone, Debug, PartialEq)]
pub enum ModuleError {
    /// Invalid or missing configuration value.
    Config(ConfigError),
    /// A field file could not be loaded.
    FieldFile(FieldFileError),
    /// A detector field was queried but never installed.
    FieldQuery(FieldQueryError),
    /// The message bus contract was violated.
    Messenger(MessengerError),
    /// The module needs a detector but is not bound to one.
    MissingDetector,
    /// The module failed for this event.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The module failed in a way that makes further events meaningless.
    NonRecoverable {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl ModuleError {
    /// Whether processing can continue with the next event.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::FieldFile(_) | Self::MissingDetector | Self::NonRecoverable { .. }
        )
    }
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::FieldFile(e) => write!(f, "field file error: {e}"),
            Self::FieldQuery(e) => write!(f, "field query failed: {e}"),
            Self::Messenger(e) => write!(f, "messenger error: {e}"),
            Self::MissingDetector => write!(f, "module is not bound to a detector"),
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::NonRecoverable { reason } => write!(f, "non-recoverable failure: {reason}"),
        }
    }
}

impl Error for ModuleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::FieldFile(e) => Some(e),
            Self::FieldQuery(e) => Some(e),
            Self::Messenger(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ModuleError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<FieldFileError> for ModuleError {
    fn from(e: FieldFileError) -> Self {
        Self::FieldFile(e)
    }
}

impl From<FieldQueryError> for ModuleError {
    fn from(e: FieldQueryError) -> Self {
        Self::FieldQuery(e)
    }
}

impl From<MessengerError> for ModuleError {
    fn from(e: MessengerError) -> Self {
        Self::Messenger(e)
    }
}
