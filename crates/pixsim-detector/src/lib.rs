//! Detector geometry and the field query surface used by modules.
//!
//! A [`DetectorModel`] describes the sensor geometry. A [`Detector`]
//! binds a model to a name and carries the fields installed for it at
//! initialization. Each field is either a tabulated grid or an analytic
//! function ([`FieldSource`]); queries dispatch on that tag so callers
//! never need to know which representation is behind a field.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod detector;
pub mod error;
pub mod field;
pub mod model;

pub use detector::{Detector, FieldKind};
pub use error::FieldQueryError;
pub use field::{DetectorField, FieldSource, GridBoundary, GridField};
pub use model::{DetectorModel, DetectorModelBuilder};
