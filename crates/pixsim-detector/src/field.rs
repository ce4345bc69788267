//! Installed fields: a tagged union over grid tables and functions.
//!
//! Coordinates handed to [`DetectorField::evaluate`] are relative to the
//! centre of the pixel the query refers to. The z coordinate is in the
//! detector's local frame and must lie inside the field's thickness
//! domain; outside it the field is zero.

use std::fmt;
use std::sync::Arc;

use pixsim_core::{Point3, ThicknessDomain, Vector2};
use pixsim_field::{FieldData, FieldFunction, FieldType, FieldValue};

/// What a grid lookup does for positions outside the table's extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridBoundary {
    /// The table repeats with its own extent; used for fields that are
    /// identical in every pixel cell.
    Periodic,
    /// The field is zero outside the table.
    Bounded,
}

/// A tabulated field with its placement relative to the pixel grid.
#[derive(Clone, Debug)]
pub struct GridField<T: FieldValue> {
    /// Shared table, possibly used by several detectors.
    pub data: Arc<FieldData<T>>,
    /// Table extent in x/y in units of the pixel pitch.
    pub scale: [f64; 2],
    /// Shift in mm added to the pixel-relative position before lookup.
    pub offset: [f64; 2],
    /// Behaviour outside the table extent.
    pub boundary: GridBoundary,
}

/// Backing representation of an installed field.
#[derive(Clone)]
pub enum FieldSource<T: FieldValue> {
    /// Tabulated grid.
    Grid(GridField<T>),
    /// Closed-form function.
    Function(FieldFunction<T>),
}

impl<T: FieldValue> fmt::Debug for FieldSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(grid) => f.debug_tuple("Grid").field(grid).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// A field installed on a detector.
#[derive(Clone, Debug)]
pub struct DetectorField<T: FieldValue> {
    source: FieldSource<T>,
    thickness_domain: ThicknessDomain,
    field_type: FieldType,
}

impl<T: FieldValue> DetectorField<T> {
    /// Wrap a grid table.
    pub fn grid(grid: GridField<T>, thickness_domain: ThicknessDomain) -> Self {
        Self {
            source: FieldSource::Grid(grid),
            thickness_domain,
            field_type: FieldType::Grid,
        }
    }

    /// Wrap a function.
    pub fn function(
        function: FieldFunction<T>,
        thickness_domain: ThicknessDomain,
        field_type: FieldType,
    ) -> Self {
        Self {
            source: FieldSource::Function(function),
            thickness_domain,
            field_type,
        }
    }

    /// The backing representation.
    pub fn source(&self) -> &FieldSource<T> {
        &self.source
    }

    /// Range of z over which the field is non-zero.
    pub fn thickness_domain(&self) -> ThicknessDomain {
        self.thickness_domain
    }

    /// How the field was produced.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Evaluate at `local`, a position relative to the centre of a pixel
    /// with pitch `pitch`.
    pub fn evaluate(&self, local: Point3, pitch: Vector2) -> T {
        if !self.thickness_domain.contains(local.z) {
            return T::default();
        }
        match &self.source {
            FieldSource::Function(function) => function(local),
            FieldSource::Grid(grid) => {
                let fz = (local.z - self.thickness_domain.min) / self.thickness_domain.span();
                let fx = grid_fraction(local.x + grid.offset[0], grid.scale[0] * pitch.x, grid.boundary);
                let fy = grid_fraction(local.y + grid.offset[1], grid.scale[1] * pitch.y, grid.boundary);
                match (fx, fy) {
                    (Some(fx), Some(fy)) => grid.data.sample_fraction(fx, fy, fz).unwrap_or_default(),
                    _ => T::default(),
                }
            }
        }
    }
}

/// Fractional position of `coord` inside a table of extent `span`
/// centred on the origin.
fn grid_fraction(coord: f64, span: f64, boundary: GridBoundary) -> Option<f64> {
    let fraction = coord / span + 0.5;
    match boundary {
        GridBoundary::Periodic => Some(fraction.rem_euclid(1.0)),
        GridBoundary::Bounded => (0.0..=1.0).contains(&fraction).then_some(fraction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PITCH: Vector2 = Vector2::new(0.05, 0.05);
    const DOMAIN: ThicknessDomain = ThicknessDomain::new(-0.1, 0.1);

    /// Two bins along x (values 1 and 2), one along y, two along z
    /// (offset by 10 in the upper half).
    fn two_bin_grid(boundary: GridBoundary) -> DetectorField<f64> {
        let data = FieldData::new(vec![1.0, 11.0, 2.0, 12.0], [2, 1, 2], [0.05, 0.05, 0.2]).unwrap();
        DetectorField::grid(
            GridField {
                data: Arc::new(data),
                scale: [1.0, 1.0],
                offset: [0.0, 0.0],
                boundary,
            },
            DOMAIN,
        )
    }

    #[test]
    fn grid_lookup_is_centred_on_the_pixel() {
        let field = two_bin_grid(GridBoundary::Bounded);
        assert_eq!(field.evaluate(Point3::new(-0.01, 0.0, -0.05), PITCH), 1.0);
        assert_eq!(field.evaluate(Point3::new(0.01, 0.0, -0.05), PITCH), 2.0);
        assert_eq!(field.evaluate(Point3::new(0.01, 0.0, 0.05), PITCH), 12.0);
    }

    #[test]
    fn bounded_grid_is_zero_outside() {
        let field = two_bin_grid(GridBoundary::Bounded);
        assert_eq!(field.evaluate(Point3::new(0.03, 0.0, 0.0), PITCH), 0.0);
    }

    #[test]
    fn periodic_grid_wraps_into_the_next_cell() {
        let field = two_bin_grid(GridBoundary::Periodic);
        // 0.04 is one pitch right of -0.01.
        assert_eq!(field.evaluate(Point3::new(0.04, 0.0, -0.05), PITCH), 1.0);
        assert_eq!(field.evaluate(Point3::new(-0.04, 0.0, -0.05), PITCH), 2.0);
    }

    #[test]
    fn outside_thickness_domain_is_zero() {
        let field = two_bin_grid(GridBoundary::Periodic);
        assert_eq!(field.evaluate(Point3::new(0.0, 0.0, 0.2), PITCH), 0.0);
        let f: DetectorField<f64> =
            DetectorField::function(Arc::new(|_: Point3| 7.0), DOMAIN, FieldType::Constant);
        assert_eq!(f.evaluate(Point3::new(0.0, 0.0, -0.3), PITCH), 0.0);
        assert_eq!(f.evaluate(Point3::new(0.0, 0.0, 0.0), PITCH), 7.0);
    }

    #[test]
    fn offset_shifts_the_lookup() {
        let mut field = two_bin_grid(GridBoundary::Bounded);
        if let FieldSource::Grid(grid) = &mut field.source {
            grid.offset = [0.02, 0.0];
        }
        assert_eq!(field.evaluate(Point3::new(-0.01, 0.0, -0.05), PITCH), 2.0);
    }

    #[test]
    fn field_type_follows_installation() {
        assert_eq!(two_bin_grid(GridBoundary::Bounded).field_type(), FieldType::Grid);
        let f: DetectorField<f64> =
            DetectorField::function(Arc::new(|_: Point3| 0.0), DOMAIN, FieldType::Linear);
        assert_eq!(f.field_type(), FieldType::Linear);
        assert_eq!(format!("{:?}", f.source()), "Function(..)");
    }

    proptest! {
        #[test]
        fn periodic_lookup_repeats_every_span(
            x in -0.02f64..0.02,
            z in -0.09f64..0.09,
            k in -5i32..5,
        ) {
            let field = two_bin_grid(GridBoundary::Periodic);
            // Stay clear of bin edges, where rounding of the shift may
            // change the bin.
            prop_assume!(x.abs() > 1e-6 && (x.abs() - 0.025).abs() > 1e-6);
            prop_assume!(z.abs() > 1e-6);
            let a = field.evaluate(Point3::new(x, 0.0, z), PITCH);
            let b = field.evaluate(Point3::new(x + f64::from(k) * 0.05, 0.0, z), PITCH);
            prop_assert_eq!(a, b);
        }
    }
}
