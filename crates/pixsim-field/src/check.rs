//! Consistency checks between a field table and the sensor geometry.
//!
//! A tabulated field is addressed relative to a pixel and wraps at pixel
//! boundaries, which only works when its extent spans a whole number of
//! pixel pitches. Its thickness should also match the depleted region.
//! Mismatches are reported, not rejected: an approximate field is still
//! usable.

use std::fmt;

use pixsim_core::{approx_equal, ThicknessDomain, Vector2};

/// A geometry inconsistency between a field table and its detector.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryMismatch {
    /// The table thickness differs from the depleted thickness.
    Thickness {
        /// Thickness declared by the field table.
        field: f64,
        /// Thickness of the depleted region.
        depleted: f64,
    },
    /// The table extent in x or y is not a multiple of the pixel pitch.
    PitchMultiple {
        /// Table extent in the sensor plane.
        field: Vector2,
        /// Pixel pitch.
        pitch: Vector2,
    },
}

impl fmt::Display for GeometryMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thickness { field, depleted } => {
                write!(
                    f,
                    "field thickness is {field} mm but the depleted region is {depleted} mm"
                )
            }
            Self::PitchMultiple { field, pitch } => {
                write!(
                    f,
                    "field size is {field} mm but expecting a multiple of the pixel pitch {pitch} mm"
                )
            }
        }
    }
}

/// Whether `extent` is a positive whole multiple of `pitch`.
fn is_multiple_of(extent: f64, pitch: f64) -> bool {
    if pitch <= 0.0 || !extent.is_finite() || !pitch.is_finite() {
        return false;
    }
    let n = (extent / pitch).round();
    n >= 1.0 && approx_equal(extent, n * pitch)
}

/// Compare a field's extent `[size_x, size_y, thickness]` with the
/// detector's pitch and depleted region.
///
/// Returns every mismatch found, empty when the geometry is consistent.
/// Mismatches are also logged as warnings.
pub fn check_detector_match(
    field_size: [f64; 3],
    thickness_domain: ThicknessDomain,
    pixel_pitch: Vector2,
) -> Vec<GeometryMismatch> {
    let mut mismatches = Vec::new();

    let depleted = thickness_domain.span();
    if !approx_equal(field_size[2], depleted) {
        mismatches.push(GeometryMismatch::Thickness {
            field: field_size[2],
            depleted,
        });
    }

    if !is_multiple_of(field_size[0], pixel_pitch.x) || !is_multiple_of(field_size[1], pixel_pitch.y)
    {
        mismatches.push(GeometryMismatch::PitchMultiple {
            field: Vector2::new(field_size[0], field_size[1]),
            pitch: pixel_pitch,
        });
    }

    for mismatch in &mismatches {
        log::warn!("{mismatch}");
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PITCH: Vector2 = Vector2::new(0.055, 0.055);
    const DOMAIN: ThicknessDomain = ThicknessDomain::new(-0.1, 0.1);

    #[test]
    fn consistent_geometry_reports_nothing() {
        assert!(check_detector_match([0.055, 0.055, 0.2], DOMAIN, PITCH).is_empty());
        assert!(check_detector_match([0.165, 0.11, 0.2], DOMAIN, PITCH).is_empty());
    }

    #[test]
    fn thickness_mismatch_is_reported() {
        let m = check_detector_match([0.055, 0.055, 0.3], DOMAIN, PITCH);
        assert_eq!(
            m,
            vec![GeometryMismatch::Thickness {
                field: 0.3,
                depleted: DOMAIN.span()
            }]
        );
    }

    #[test]
    fn fractional_pitch_is_reported() {
        let m = check_detector_match([0.08, 0.055, 0.2], DOMAIN, PITCH);
        assert_eq!(m.len(), 1);
        assert!(matches!(m[0], GeometryMismatch::PitchMultiple { .. }));
        assert!(m[0].to_string().contains("multiple of the pixel pitch"));
    }

    #[test]
    fn extent_smaller_than_pitch_is_reported() {
        let m = check_detector_match([0.02, 0.055, 0.2], DOMAIN, PITCH);
        assert_eq!(m.len(), 1);
    }

    proptest! {
        #[test]
        fn whole_multiples_never_warn(
            nx in 1u32..20,
            ny in 1u32..20,
            px in 0.01f64..0.5,
            py in 0.01f64..0.5,
        ) {
            let pitch = Vector2::new(px, py);
            let size = [nx as f64 * px, ny as f64 * py, DOMAIN.span()];
            prop_assert!(check_detector_match(size, DOMAIN, pitch).is_empty());
        }

        #[test]
        fn off_grid_extents_warn(
            n in 1u32..20,
            p in 0.01f64..0.5,
            frac in 0.05f64..0.95,
        ) {
            let pitch = Vector2::new(p, p);
            let size = [(n as f64 + frac) * p, p, DOMAIN.span()];
            let m = check_detector_match(size, DOMAIN, pitch);
            prop_assert_eq!(m.len(), 1);
        }
    }
}
