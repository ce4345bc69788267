//! Errors raised by detector field queries.

use std::error::Error;
use std::fmt;

use pixsim_core::DetectorId;

use crate::detector::FieldKind;

/// Failure to evaluate a field on a detector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldQueryError {
    /// No field of the requested kind was installed on the detector.
    NotConfigured {
        /// The detector that was queried.
        detector: DetectorId,
        /// The field kind that was requested.
        kind: FieldKind,
    },
}

impl fmt::Display for FieldQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured { detector, kind } => {
                write!(f, "no {kind} configured for detector '{detector}'")
            }
        }
    }
}

impl Error for FieldQueryError {}
