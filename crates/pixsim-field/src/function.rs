//! Analytic fields evaluated in closed form.
//!
//! A [`FieldFunction`] maps a position in the local pixel frame to a
//! value. Functions capture only their construction parameters and hold
//! no mutable state, so one instance can be shared by `Arc` and called
//! from any number of threads.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use pixsim_core::{Point3, ThicknessDomain, Vector2, Vector3};

/// A pure position → value mapping.
pub type FieldFunction<T> = Arc<dyn Fn(Point3) -> T + Send + Sync>;

/// How an installed field was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Tabulated grid loaded from a file.
    Grid,
    /// Uniform value throughout the sensor.
    Constant,
    /// Varies linearly along the thickness.
    Linear,
    /// Any other analytic function.
    Custom,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Grid => "grid",
            Self::Constant => "constant",
            Self::Linear => "linear",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Number of image-charge terms summed by [`pad_potential_function`].
///
/// The series decays quickly with the sensor thickness; 100 terms is far
/// beyond the precision needed for realistic sensors.
pub const PAD_POTENTIAL_SERIES_TERMS: u32 = 100;

/// Solid-angle term for one pad corner.
///
/// Zero whenever the point lies in the plane of either pad edge, which
/// also covers the `0/0` case on the readout plane.
fn corner_term(a: f64, b: f64, c: f64) -> f64 {
    let ab = a * b;
    if ab == 0.0 {
        return 0.0;
    }
    (ab / c / (a * a + b * b + c * c).sqrt()).atan()
}

/// Sum of the four signed corner terms for a rectangular pad of size
/// `implant` centred on the origin, seen from `(x, y)` at height `u`.
fn pad_corners(implant: Vector2, x: f64, y: f64, u: f64) -> f64 {
    let x1 = x - implant.x / 2.0;
    let x2 = x + implant.x / 2.0;
    let y1 = y - implant.y / 2.0;
    let y2 = y + implant.y / 2.0;
    corner_term(x1, y1, u) + corner_term(x2, y2, u) - corner_term(x1, y2, u) - corner_term(x2, y1, u)
}

/// Weighting potential of a rectangular pad between two grounded planes.
///
/// The pad of size `implant` sits on the readout plane at
/// `thickness_domain.max`, centred on the local origin; the back plane is
/// at `thickness_domain.min`. The potential is 1 on the pad and falls to
/// 0 on the back plane and far away laterally. Reference:
/// doi:10.1016/j.nima.2014.08.044.
pub fn pad_potential_function(
    implant: Vector2,
    thickness_domain: ThicknessDomain,
) -> FieldFunction<f64> {
    Arc::new(move |pos: Point3| {
        let d = thickness_domain.span();
        let local_z = thickness_domain.max - pos.z;

        let mut sum = 0.0;
        for n in 1..=PAD_POTENTIAL_SERIES_TERMS {
            let n = f64::from(n);
            sum += pad_corners(implant, pos.x, pos.y, 2.0 * n * d - local_z)
                - pad_corners(implant, pos.x, pos.y, 2.0 * n * d + local_z);
        }

        1.0 / (2.0 * PI) * (pad_corners(implant, pos.x, pos.y, local_z) - sum)
    })
}

/// Uniform electric field of a fully depleted planar sensor.
///
/// Field strength is `bias_voltage / thickness`, pointing along +z.
pub fn constant_field_function(
    bias_voltage: f64,
    thickness_domain: ThicknessDomain,
) -> FieldFunction<Vector3> {
    let field_z = bias_voltage / thickness_domain.span();
    Arc::new(move |_pos: Point3| Vector3::new(0.0, 0.0, field_z))
}

/// Linear electric field of a planar sensor.
///
/// With `depletion_voltage` below `bias_voltage` the sensor is
/// over-depleted and the field stays positive everywhere; it is largest
/// at the readout side. Values that would turn negative are clamped to
/// zero.
pub fn linear_field_function(
    bias_voltage: f64,
    depletion_voltage: f64,
    thickness_domain: ThicknessDomain,
) -> FieldFunction<Vector3> {
    let eff_thickness = thickness_domain.span();
    Arc::new(move |pos: Point3| {
        let z_rel = thickness_domain.max - pos.z;
        let field_z = ((bias_voltage - depletion_voltage) / eff_thickness
            + 2.0 * (depletion_voltage / eff_thickness) * (1.0 - z_rel / eff_thickness))
            .max(0.0);
        Vector3::new(0.0, 0.0, field_z)
    })
}
