//! Pipeline driver for pixsim.
//!
//! [`Simulation`] owns the detectors, the module instances, the message
//! bus and the field cache. Setup initializes every module and fixes the
//! execution order; after that, each call to
//! [`Simulation::run_event`] runs the whole pipeline once.
//!
//! Errors during setup abort construction. Errors during an event
//! abandon that event only, unless the failing module reports them as
//! non-recoverable.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod simulation;

pub use config::{DetectorConfig, ModuleEntry, SimulationConfig};
pub use error::{EventError, FinalizeError, SetupError};
pub use metrics::EventMetrics;
pub use simulation::{RunSummary, Simulation};
