//! Geometry primitives: points, vectors, pixel indices and the thickness domain.
//!
//! All lengths are in millimetres, the framework's internal length unit.

use smallvec::SmallVec;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Relative floating-point comparison used by geometry consistency checks.
///
/// Two values are considered equal when they differ by no more than a few
/// units in the last place of the larger magnitude.
pub fn approx_equal(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs());
    (a - b).abs() <= 4.0 * f64::EPSILON * scale
}

/// A position in the local detector frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    /// x coordinate.
    pub x: f64,
    /// y coordinate.
    pub y: f64,
    /// z coordinate (along the sensor thickness).
    pub z: f64,
}

impl Point3 {
    /// Construct a point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin of the local frame.
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add<Vector3> for Point3 {
    type Output = Point3;

    fn add(self, rhs: Vector3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Vector3;

    fn sub(self, rhs: Point3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// A displacement or field vector in three dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    /// x component.
    pub x: f64,
    /// y component.
    pub y: f64,
    /// z component.
    pub z: f64,
}

impl Vector3 {
    /// Construct a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Components as an array, in x, y, z order.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

/// A two-dimensional size or displacement (pixel pitch, implant size).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2 {
    /// x component.
    pub x: f64,
    /// y component.
    pub y: f64,
}

impl Vector2 {
    /// Construct a vector from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A position in the sensor plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    /// x coordinate.
    pub x: f64,
    /// y coordinate.
    pub y: f64,
}

impl Point2 {
    /// Construct a point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Index of a pixel in the sensor matrix.
///
/// Signed so that neighbourhoods of edge pixels can be expressed before
/// they are clipped to the matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelIndex {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl PixelIndex {
    /// Construct a pixel index.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This pixel and its eight direct neighbours, row-major.
    pub fn neighbourhood(self) -> SmallVec<[PixelIndex; 9]> {
        let mut out = SmallVec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                out.push(PixelIndex::new(self.x + dx, self.y + dy));
            }
        }
        out
    }
}

impl fmt::Display for PixelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The z-axis span of the sensor's depleted region, as `(min, max)`.
///
/// The readout plane sits at `max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThicknessDomain {
    /// Lower bound of the active region.
    pub min: f64,
    /// Upper bound of the active region (readout side).
    pub max: f64,
}

impl ThicknessDomain {
    /// Construct a domain from its bounds.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Thickness of the active region.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `z` lies inside the domain, bounds included.
    pub fn contains(&self, z: f64) -> bool {
        self.min <= z && z <= self.max
    }
}

impl fmt::Display for ThicknessDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn approx_equal_tolerates_rounding() {
        assert!(approx_equal(200.0 * 1e-3, 0.2));
        assert!(approx_equal(0.1 + 0.2, 0.3));
        assert!(!approx_equal(0.2, 0.2001));
        assert!(approx_equal(0.0, 0.0));
    }

    #[test]
    fn neighbourhood_is_three_by_three() {
        let n = PixelIndex::new(0, 0).neighbourhood();
        assert_eq!(n.len(), 9);
        assert_eq!(n[0], PixelIndex::new(-1, -1));
        assert_eq!(n[4], PixelIndex::new(0, 0));
        assert_eq!(n[8], PixelIndex::new(1, 1));
    }

    #[test]
    fn thickness_domain_bounds() {
        let d = ThicknessDomain::new(-0.1, 0.1);
        assert!((d.span() - 0.2).abs() < 1e-15);
        assert!(d.contains(0.1));
        assert!(d.contains(-0.1));
        assert!(!d.contains(0.10001));
    }

    #[test]
    fn point_difference_is_vector() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(0.5, 0.5, 0.5);
        assert_eq!(a - b, Vector3::new(0.5, 1.5, 2.5));
        assert_eq!(b + (a - b), a);
    }

    proptest! {
        #[test]
        fn approx_equal_accepts_a_few_ulps(
            magnitude in 1.0e-3f64..1.0e6,
            negative in any::<bool>(),
            ulps in 0u64..4,
        ) {
            let a = if negative { -magnitude } else { magnitude };
            let b = f64::from_bits(a.to_bits() + ulps);
            prop_assert!(approx_equal(a, b));
            prop_assert!(approx_equal(b, a));
            prop_assert!(!approx_equal(a, a * (1.0 + 1e-9)));
        }
    }
}
