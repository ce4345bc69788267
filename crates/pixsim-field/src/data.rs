//! [`FieldData`]: an immutable, discretized field table.

use std::path::{Path, PathBuf};

use crate::value::FieldValue;

/// A tabulated field: samples on a regular `nx × ny × nz` grid.
///
/// The table covers a box of `size[0] × size[1]` in the sensor plane
/// and `size[2]` along the thickness. Samples are stored x-major:
/// index `(ix * ny + iy) * nz + iz`.
///
/// Tables are never mutated after construction and are shared through
/// `Arc<FieldData<T>>`; lookups therefore need no synchronization.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldData<T: FieldValue> {
    samples: Vec<T>,
    dimensions: [usize; 3],
    size: [f64; 3],
    source: Option<PathBuf>,
}

impl<T: FieldValue> FieldData<T> {
    /// Build a table from samples in x-major order.
    ///
    /// Returns `Err` if any dimension is zero, any extent is not finite
    /// and positive, or the sample count differs from the product of
    /// the dimensions.
    pub fn new(samples: Vec<T>, dimensions: [usize; 3], size: [f64; 3]) -> Result<Self, String> {
        if dimensions.iter().any(|&d| d == 0) {
            return Err(format!("dimensions {dimensions:?} contain a zero"));
        }
        if size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(format!("extents {size:?} must be finite and positive"));
        }
        let expected = dimensions
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| format!("dimensions {dimensions:?} overflow"))?;
        if samples.len() != expected {
            return Err(format!(
                "expected {expected} samples for dimensions {dimensions:?}, got {}",
                samples.len()
            ));
        }
        Ok(Self {
            samples,
            dimensions,
            size,
            source: None,
        })
    }

    /// Attach the path this table was read from.
    pub(crate) fn with_source(mut self, path: PathBuf) -> Self {
        self.source = Some(path);
        self
    }

    /// File the table was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Grid dimensions `[nx, ny, nz]`.
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Physical extent `[size_x, size_y, thickness]` in millimetres.
    pub fn size(&self) -> [f64; 3] {
        self.size
    }

    /// Physical size of one grid cell along each axis.
    pub fn cell_pitch(&self) -> [f64; 3] {
        [
            self.size[0] / self.dimensions[0] as f64,
            self.size[1] / self.dimensions[1] as f64,
            self.size[2] / self.dimensions[2] as f64,
        ]
    }

    /// Total number of grid cells.
    pub fn cell_count(&self) -> usize {
        self.samples.len()
    }

    /// The raw sample buffer in x-major order.
    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    /// Sample at grid index `(ix, iy, iz)`, or `None` outside the grid.
    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> Option<T> {
        let [nx, ny, nz] = self.dimensions;
        if ix >= nx || iy >= ny || iz >= nz {
            return None;
        }
        self.samples.get((ix * ny + iy) * nz + iz).copied()
    }

    /// Nearest-bin lookup by fractional position.
    ///
    /// Each fraction spans `[0, 1)` over the table's extent on that axis.
    /// A fraction of exactly 1 maps to the last bin so that the upper
    /// surface stays addressable. Axes with a single bin ignore their
    /// fraction, which lets 2D tables be used as 3D ones.
    pub fn sample_fraction(&self, fx: f64, fy: f64, fz: f64) -> Option<T> {
        let ix = Self::bin(fx, self.dimensions[0])?;
        let iy = Self::bin(fy, self.dimensions[1])?;
        let iz = Self::bin(fz, self.dimensions[2])?;
        self.get(ix, iy, iz)
    }

    fn bin(fraction: f64, bins: usize) -> Option<usize> {
        if bins == 1 {
            return Some(0);
        }
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return None;
        }
        let idx = (fraction * bins as f64).floor() as usize;
        Some(idx.min(bins - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> FieldData<f64> {
        // 2 x 2 x 4, value encodes its own index.
        let samples = (0..16).map(|i| i as f64).collect();
        FieldData::new(samples, [2, 2, 4], [0.055, 0.055, 0.2]).unwrap()
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = FieldData::new(vec![0.0; 15], [2, 2, 4], [1.0, 1.0, 1.0]).unwrap_err();
        assert!(err.contains("expected 16 samples"));
    }

    #[test]
    fn rejects_zero_dimension_and_bad_extent() {
        assert!(FieldData::<f64>::new(vec![], [0, 1, 1], [1.0, 1.0, 1.0]).is_err());
        assert!(FieldData::new(vec![0.0], [1, 1, 1], [1.0, -1.0, 1.0]).is_err());
        assert!(FieldData::new(vec![0.0], [1, 1, 1], [1.0, f64::NAN, 1.0]).is_err());
    }

    #[test]
    fn x_major_indexing() {
        let d = ramp();
        assert_eq!(d.get(0, 0, 0), Some(0.0));
        assert_eq!(d.get(0, 0, 3), Some(3.0));
        assert_eq!(d.get(0, 1, 0), Some(4.0));
        assert_eq!(d.get(1, 0, 0), Some(8.0));
        assert_eq!(d.get(2, 0, 0), None);
    }

    #[test]
    fn fractional_lookup_uses_nearest_bin() {
        let d = ramp();
        assert_eq!(d.sample_fraction(0.1, 0.1, 0.0), Some(0.0));
        assert_eq!(d.sample_fraction(0.9, 0.1, 0.6), Some(10.0));
        assert_eq!(d.sample_fraction(1.0, 1.0, 1.0), Some(15.0));
        assert_eq!(d.sample_fraction(-0.01, 0.5, 0.5), None);
        assert_eq!(d.sample_fraction(0.5, 0.5, 1.01), None);
    }

    #[test]
    fn single_bin_axes_ignore_fraction() {
        let d = FieldData::new(vec![1.0, 2.0], [1, 1, 2], [0.1, 0.1, 0.2]).unwrap();
        assert_eq!(d.sample_fraction(7.0, -3.0, 0.75), Some(2.0));
    }

    #[test]
    fn cell_pitch_divides_extent() {
        let d = ramp();
        let p = d.cell_pitch();
        assert!((p[0] - 0.0275).abs() < 1e-15);
        assert!((p[2] - 0.05).abs() < 1e-15);
    }
}
