//! Module trait and pipeline ordering for pixsim.
//!
//! A [`Module`] is one computation stage, optionally bound to a detector.
//! It declares its message subscriptions and publications through the
//! [`InitContext`] during initialization; [`execution_order`] then turns
//! those declarations into a dependency order that the engine follows for
//! every event.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod module;
pub mod order;

pub use context::{FinalizeContext, InitContext, RunContext};
pub use error::ModuleError;
pub use module::Module;
pub use order::{execution_order, OrderError};
