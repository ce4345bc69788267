//! Field representations for pixsim detectors.
//!
//! Two sources of field values share one query surface further up in
//! `pixsim-detector`:
//!
//! - **Tabulated grids** ([`FieldData`]) read from `init` files by
//!   [`FieldParser`]. Tables are loaded once per canonical path and shared
//!   by `Arc` between every detector that names the same file.
//! - **Analytic functions** ([`FieldFunction`]) evaluated in closed form,
//!   such as the [`pad_potential_function`] weighting potential.
//!
//! [`check_detector_match`] compares a table's physical extent against
//! the sensor geometry and reports mismatches as warnings.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod check;
pub mod data;
pub mod error;
pub mod function;
pub mod parser;
pub mod value;

pub use cache::{FieldCache, FieldParser, DEFAULT_MAX_FIELD_FILE_BYTES};
pub use check::{check_detector_match, GeometryMismatch};
pub use data::FieldData;
pub use error::FieldFileError;
pub use function::{
    constant_field_function, linear_field_function, pad_potential_function, FieldFunction,
    FieldType, PAD_POTENTIAL_SERIES_TERMS,
};
pub use parser::parse_init;
pub use value::FieldValue;
