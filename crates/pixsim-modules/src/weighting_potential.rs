//! Weighting potential reader.
//!
//! Installs the weighting potential on its detector, either from an
//! `init` grid file or as the analytic planar-pad potential.
//!
//! # Configuration
//!
//! | key | default | meaning |
//! |---|---|---|
//! | `model` | required | `init` or `pad` |
//! | `file_name` | required for `init` | path of the grid file |
//! | `output_plots` | `false` | sample a [`PotentialProfile`] after installation |
//! | `output_plots_steps` | `500` | samples per axis of the profile |
//! | `output_plots_position` | `0 0` | x/y of the depth profile, in mm |

use pixsim_core::{DetectorId, PixelIndex, Point2, Point3};
use pixsim_detector::Detector;
use pixsim_field::{pad_potential_function, FieldType};
use pixsim_module::{InitContext, Module, ModuleError, RunContext};

use crate::{field_model, grid_scale};

/// Weighting potential sampled for inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct PotentialProfile {
    /// x/y position of the depth profile.
    pub position: Point2,
    /// `(z, potential)` pairs at the centres of `steps` bins spanning the
    /// sensor thickness, relative to pixel (0, 0).
    pub depth: Vec<(f64, f64)>,
    /// Lateral range of the x-z scan, in mm.
    pub x_range: (f64, f64),
    /// z range of both samplings, in mm.
    pub z_range: (f64, f64),
    /// Samples per axis.
    pub steps: usize,
    /// Potential of pixel (1, 0) on a `steps x steps` x-z grid at y = 0,
    /// row-major with z as the row.
    pub scan: Vec<f64>,
}

impl PotentialProfile {
    /// Sample `detector`'s weighting potential.
    fn sample(detector: &Detector, position: Point2, steps: usize) -> Result<Self, ModuleError> {
        let model = detector.model();
        let domain = model.thickness_domain();
        let pitch = model.pixel_size().x;
        let (min, max) = (domain.min, domain.max);
        let bin = |j: usize, lo: f64, width: f64| {
            lo + (j as f64 + 0.5) / steps as f64 * width
        };

        let mut depth = Vec::with_capacity(steps);
        for j in 0..steps {
            let z = bin(j, min, max - min);
            let potential = detector
                .weighting_potential(Point3::new(position.x, position.y, z), PixelIndex::new(0, 0))?;
            depth.push((z, potential));
        }

        let x_range = (-1.5 * pitch, 1.5 * pitch);
        let mut scan = Vec::with_capacity(steps * steps);
        for j in 0..steps {
            log::trace!("Plotting progress {}%", 100 * j / steps);
            let z = bin(j, min, max - min);
            for k in 0..steps {
                let x = bin(k, x_range.0, 3.0 * pitch);
                scan.push(
                    detector.weighting_potential(Point3::new(x, 0.0, z), PixelIndex::new(1, 0))?,
                );
            }
        }

        Ok(Self {
            position,
            depth,
            x_range,
            z_range: (min, max),
            steps,
            scan,
        })
    }

    /// Potential at row `z_bin`, column `x_bin` of the x-z scan.
    pub fn scan_at(&self, z_bin: usize, x_bin: usize) -> Option<f64> {
        if z_bin >= self.steps || x_bin >= self.steps {
            return None;
        }
        self.scan.get(z_bin * self.steps + x_bin).copied()
    }
}

/// Installs a weighting potential on one detector.
pub struct WeightingPotentialReader {
    detector: DetectorId,
    profile: Option<PotentialProfile>,
}

impl WeightingPotentialReader {
    /// Create a reader for `detector`.
    pub fn new(detector: impl Into<DetectorId>) -> Self {
        Self {
            detector: detector.into(),
            profile: None,
        }
    }

    /// The diagnostic profile, when `output_plots` was enabled.
    pub fn profile(&self) -> Option<&PotentialProfile> {
        self.profile.as_ref()
    }
}

impl Module for WeightingPotentialReader {
    fn name(&self) -> &str {
        "WeightingPotentialReader"
    }

    fn detector(&self) -> Option<&DetectorId> {
        Some(&self.detector)
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError> {
        let config = ctx.config().clone();
        let model = field_model(&config, &["init", "pad"])?;
        let geometry = ctx.detector()?.model().clone();
        let domain = geometry.thickness_domain();

        if model == "init" {
            log::trace!("Fetching weighting potential from init file");
            let path = config.get_path("file_name", true)?;
            let data = ctx.field_cache().weighting_potentials().get_by_file_name(&path)?;
            let scale = grid_scale(data.size(), domain, &geometry);
            ctx.detector_mut()?
                .set_weighting_potential_grid(data, scale, [0.0, 0.0], domain);
        } else {
            log::trace!("Adding weighting potential from pad in plane condenser");
            let function = pad_potential_function(geometry.implant_size(), domain);
            ctx.detector_mut()?
                .set_weighting_potential_function(function, domain, FieldType::Custom);
        }

        if config.get_or("output_plots", false)? {
            let steps: usize = config.get_or("output_plots_steps", 500)?;
            if steps == 0 {
                return Err(config
                    .invalid_value("output_plots_steps", "must be at least 1")
                    .into());
            }
            let position = config.get_or("output_plots_position", Point2::new(0.0, 0.0))?;
            let profile = PotentialProfile::sample(ctx.detector()?, position, steps)?;
            log::info!(
                "Sampled weighting potential of {} on {steps}x{steps} points",
                self.detector
            );
            self.profile = Some(profile);
        }
        Ok(())
    }

    fn run(&mut self, _ctx: &mut RunContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }
}
