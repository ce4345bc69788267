//! The [`FieldValue`] trait: scalar or vector samples stored in a field.

use pixsim_core::Vector3;
use std::fmt;

/// A value a field can hold at one position.
///
/// Implemented for `f64` (potentials) and [`Vector3`] (electric fields).
/// `COMPONENTS` is the number of numbers per grid cell in a field file.
pub trait FieldValue: Copy + Default + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Number of numeric components per sample.
    const COMPONENTS: usize;

    /// Build a value from exactly `COMPONENTS` numbers.
    fn from_components(components: &[f64]) -> Self;

    /// Multiply every component by `factor`.
    fn scaled(self, factor: f64) -> Self;
}

impl FieldValue for f64 {
    const COMPONENTS: usize = 1;

    fn from_components(components: &[f64]) -> Self {
        components[0]
    }

    fn scaled(self, factor: f64) -> Self {
        self * factor
    }
}

impl FieldValue for Vector3 {
    const COMPONENTS: usize = 3;

    fn from_components(components: &[f64]) -> Self {
        Vector3::new(components[0], components[1], components[2])
    }

    fn scaled(self, factor: f64) -> Self {
        self * factor
    }
}
