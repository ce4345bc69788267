//! Core types for the pixsim detector simulation framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared by every other pixsim crate:
//! identifiers, geometry primitives, the [`Object`] record trait and the
//! [`Configuration`] key/value section consumed by modules.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod geometry;
pub mod id;
pub mod object;

pub use config::{ConfigError, ConfigValue, Configuration};
pub use geometry::{approx_equal, PixelIndex, Point2, Point3, ThicknessDomain, Vector2, Vector3};
pub use id::{DetectorId, EventNumber, ModuleId};
pub use object::Object;
