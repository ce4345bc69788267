//! [`DetectorModel`]: immutable sensor geometry.
//!
//! The local frame puts the centre of pixel `(0, 0)` at the origin of
//! the sensor plane and the sensor centre at `z = 0`; the readout side
//! is at `+thickness / 2`.

use pixsim_core::{PixelIndex, Point3, ThicknessDomain, Vector2, Vector3};

/// Geometry of a pixel sensor.
///
/// Constructed once via [`DetectorModel::builder`] and shared by `Arc`
/// with every detector and module that uses it.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorModel {
    name: String,
    number_of_pixels: [u32; 2],
    pixel_size: Vector2,
    implant_size: Vector2,
    sensor_thickness: f64,
}

/// Builder for [`DetectorModel`].
///
/// Required: `number_of_pixels`, `pixel_size`, `sensor_thickness`.
/// The implant defaults to the full pixel pitch.
#[derive(Debug)]
pub struct DetectorModelBuilder {
    name: String,
    number_of_pixels: Option<[u32; 2]>,
    pixel_size: Option<Vector2>,
    implant_size: Option<Vector2>,
    sensor_thickness: Option<f64>,
}

impl DetectorModel {
    /// Create a new builder for a model with the given type name.
    pub fn builder(name: impl Into<String>) -> DetectorModelBuilder {
        DetectorModelBuilder {
            name: name.into(),
            number_of_pixels: None,
            pixel_size: None,
            implant_size: None,
            sensor_thickness: None,
        }
    }

    /// Model type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixel matrix size in columns and rows.
    pub fn number_of_pixels(&self) -> [u32; 2] {
        self.number_of_pixels
    }

    /// Pixel pitch.
    pub fn pixel_size(&self) -> Vector2 {
        self.pixel_size
    }

    /// Size of the collection implant of one pixel.
    pub fn implant_size(&self) -> Vector2 {
        self.implant_size
    }

    /// Sensor size: pixel matrix extent in x/y, thickness in z.
    pub fn sensor_size(&self) -> Vector3 {
        Vector3::new(
            f64::from(self.number_of_pixels[0]) * self.pixel_size.x,
            f64::from(self.number_of_pixels[1]) * self.pixel_size.y,
            self.sensor_thickness,
        )
    }

    /// Centre of the sensor in the local frame.
    pub fn sensor_center(&self) -> Point3 {
        Point3::new(
            (f64::from(self.number_of_pixels[0]) - 1.0) / 2.0 * self.pixel_size.x,
            (f64::from(self.number_of_pixels[1]) - 1.0) / 2.0 * self.pixel_size.y,
            0.0,
        )
    }

    /// The sensor's full z-span, readout side at `max`.
    pub fn thickness_domain(&self) -> ThicknessDomain {
        let max = self.sensor_center().z + self.sensor_thickness / 2.0;
        ThicknessDomain::new(max - self.sensor_thickness, max)
    }

    /// Centre of a pixel on the sensor mid-plane.
    pub fn pixel_center(&self, pixel: PixelIndex) -> Point3 {
        Point3::new(
            f64::from(pixel.x) * self.pixel_size.x,
            f64::from(pixel.y) * self.pixel_size.y,
            self.sensor_center().z,
        )
    }

    /// The pixel whose cell contains `pos` in x/y, or `None` outside the
    /// matrix.
    pub fn pixel_at(&self, pos: Point3) -> Option<PixelIndex> {
        let x = (pos.x / self.pixel_size.x).round();
        let y = (pos.y / self.pixel_size.y).round();
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let pixel = PixelIndex::new(x as i32, y as i32);
        self.contains_pixel(pixel).then_some(pixel)
    }

    /// Whether a pixel index lies inside the matrix.
    pub fn contains_pixel(&self, pixel: PixelIndex) -> bool {
        pixel.x >= 0
            && pixel.y >= 0
            && (pixel.x as u32) < self.number_of_pixels[0]
            && (pixel.y as u32) < self.number_of_pixels[1]
    }

    /// Whether a position lies inside the sensor volume.
    pub fn is_within_sensor(&self, pos: Point3) -> bool {
        let center = self.sensor_center();
        let size = self.sensor_size();
        (pos.x - center.x).abs() <= size.x / 2.0
            && (pos.y - center.y).abs() <= size.y / 2.0
            && self.thickness_domain().contains(pos.z)
    }
}

impl DetectorModelBuilder {
    /// Set the pixel matrix size (default: required).
    pub fn number_of_pixels(mut self, columns: u32, rows: u32) -> Self {
        self.number_of_pixels = Some([columns, rows]);
        self
    }

    /// Set the pixel pitch (default: required).
    pub fn pixel_size(mut self, pitch: Vector2) -> Self {
        self.pixel_size = Some(pitch);
        self
    }

    /// Set the implant size (default: the pixel pitch).
    pub fn implant_size(mut self, implant: Vector2) -> Self {
        self.implant_size = Some(implant);
        self
    }

    /// Set the sensor thickness (default: required).
    pub fn sensor_thickness(mut self, thickness: f64) -> Self {
        self.sensor_thickness = Some(thickness);
        self
    }

    /// Build the model, validating all geometry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - a required value is not set
    /// - the pixel matrix is empty
    /// - any length is not finite and positive
    /// - the implant is larger than the pixel
    pub fn build(self) -> Result<DetectorModel, String> {
        let number_of_pixels = self
            .number_of_pixels
            .ok_or_else(|| "number_of_pixels is required".to_string())?;
        let pixel_size = self
            .pixel_size
            .ok_or_else(|| "pixel_size is required".to_string())?;
        let sensor_thickness = self
            .sensor_thickness
            .ok_or_else(|| "sensor_thickness is required".to_string())?;
        let implant_size = self.implant_size.unwrap_or(pixel_size);

        if number_of_pixels[0] == 0 || number_of_pixels[1] == 0 {
            return Err(format!(
                "pixel matrix {}x{} is empty",
                number_of_pixels[0], number_of_pixels[1]
            ));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(pixel_size.x) || !positive(pixel_size.y) {
            return Err(format!("pixel_size must be finite and > 0, got {pixel_size}"));
        }
        if !positive(implant_size.x) || !positive(implant_size.y) {
            return Err(format!(
                "implant_size must be finite and > 0, got {implant_size}"
            ));
        }
        if implant_size.x > pixel_size.x || implant_size.y > pixel_size.y {
            return Err(format!(
                "implant_size {implant_size} exceeds pixel_size {pixel_size}"
            ));
        }
        if !positive(sensor_thickness) {
            return Err(format!(
                "sensor_thickness must be finite and > 0, got {sensor_thickness}"
            ));
        }

        Ok(DetectorModel {
            name: self.name,
            number_of_pixels,
            pixel_size,
            implant_size,
            sensor_thickness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn timepix() -> DetectorModel {
        DetectorModel::builder("timepix")
            .number_of_pixels(256, 256)
            .pixel_size(Vector2::new(0.055, 0.055))
            .implant_size(Vector2::new(0.05, 0.05))
            .sensor_thickness(0.2)
            .build()
            .unwrap()
    }

    #[test]
    fn thickness_domain_is_centred() {
        let m = timepix();
        let d = m.thickness_domain();
        assert_abs_diff_eq!(d.min, -0.1, epsilon = 1e-15);
        assert_abs_diff_eq!(d.max, 0.1, epsilon = 1e-15);
    }

    #[test]
    fn pixel_centres_follow_the_pitch() {
        let m = timepix();
        let c = m.pixel_center(PixelIndex::new(2, 3));
        assert_abs_diff_eq!(c.x, 0.11, epsilon = 1e-15);
        assert_abs_diff_eq!(c.y, 0.165, epsilon = 1e-15);
        assert_eq!(c.z, 0.0);
    }

    #[test]
    fn pixel_lookup_rounds_to_nearest_centre() {
        let m = timepix();
        assert_eq!(
            m.pixel_at(Point3::new(0.02, 0.03, 0.0)),
            Some(PixelIndex::new(0, 1))
        );
        assert_eq!(m.pixel_at(Point3::new(-0.04, 0.0, 0.0)), None);
        assert_eq!(m.pixel_at(Point3::new(256.0 * 0.055, 0.0, 0.0)), None);
    }

    #[test]
    fn sensor_extent_covers_matrix() {
        let m = timepix();
        assert!(m.is_within_sensor(Point3::new(-0.0275, -0.0275, 0.1)));
        assert!(!m.is_within_sensor(Point3::new(-0.03, 0.0, 0.0)));
        assert!(!m.is_within_sensor(Point3::new(0.0, 0.0, 0.11)));
    }

    #[test]
    fn implant_defaults_to_pitch() {
        let m = DetectorModel::builder("pad")
            .number_of_pixels(1, 1)
            .pixel_size(Vector2::new(0.1, 0.2))
            .sensor_thickness(0.3)
            .build()
            .unwrap();
        assert_eq!(m.implant_size(), Vector2::new(0.1, 0.2));
    }

    #[test]
    fn builder_rejects_bad_geometry() {
        let base = || {
            DetectorModel::builder("bad")
                .number_of_pixels(4, 4)
                .pixel_size(Vector2::new(0.05, 0.05))
                .sensor_thickness(0.3)
        };
        assert!(base().implant_size(Vector2::new(0.06, 0.01)).build().is_err());
        assert!(base().sensor_thickness(-1.0).build().is_err());
        assert!(base().number_of_pixels(0, 4).build().is_err());
        assert!(DetectorModel::builder("x").build().is_err());
    }
}
