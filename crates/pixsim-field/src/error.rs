//! Errors raised while loading field tables from disk.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Failure to load a field file.
///
/// Field files are read once at module initialization, so every variant
/// is fatal for the run. Each carries the path that failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldFileError {
    /// The file could not be opened or read.
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Description of the I/O failure.
        reason: String,
    },
    /// The header or body does not follow the expected format, or the
    /// body is shorter than the header declares.
    Malformed {
        /// The file that failed.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
    /// The file, or the table it declares, exceeds the memory ceiling.
    Oversized {
        /// The file that failed.
        path: PathBuf,
        /// Bytes the file or table would need.
        required_bytes: u64,
        /// The configured ceiling.
        limit_bytes: u64,
    },
}

impl FieldFileError {
    /// The file this error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. } | Self::Malformed { path, .. } | Self::Oversized { path, .. } => {
                path
            }
        }
    }
}

impl fmt::Display for FieldFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => {
                write!(f, "cannot read field file '{}': {reason}", path.display())
            }
            Self::Malformed { path, reason } => {
                write!(f, "malformed field file '{}': {reason}", path.display())
            }
            Self::Oversized {
                path,
                required_bytes,
                limit_bytes,
            } => {
                write!(
                    f,
                    "field file '{}' too large: needs {required_bytes} bytes, \
                     limit is {limit_bytes}",
                    path.display()
                )
            }
        }
    }
}

impl Error for FieldFileError {}
