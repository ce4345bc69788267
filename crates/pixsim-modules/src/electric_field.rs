//! Electric field reader.
//!
//! # Configuration
//!
//! | key | default | meaning |
//! |---|---|---|
//! | `model` | required | `init`, `constant` or `linear` |
//! | `file_name` | required for `init` | grid file, values in V/cm |
//! | `bias_voltage` | required for `constant`/`linear` | in V |
//! | `depletion_voltage` | `bias_voltage` | in V, `linear` only |
//! | `depletion_depth` | full thickness | depleted depth below the readout plane, in mm |

use pixsim_core::{DetectorId, ThicknessDomain};
use pixsim_field::{constant_field_function, linear_field_function, FieldType};
use pixsim_module::{InitContext, Module, ModuleError, RunContext};

use crate::{field_model, grid_scale};

/// Installs an electric field on one detector.
///
/// The field is zero outside the depleted region, which spans the top
/// `depletion_depth` of the sensor.
pub struct ElectricFieldReader {
    detector: DetectorId,
}

impl ElectricFieldReader {
    /// Create a reader for `detector`.
    pub fn new(detector: impl Into<DetectorId>) -> Self {
        Self {
            detector: detector.into(),
        }
    }
}

impl Module for ElectricFieldReader {
    fn name(&self) -> &str {
        "ElectricFieldReader"
    }

    fn detector(&self) -> Option<&DetectorId> {
        Some(&self.detector)
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError> {
        let config = ctx.config().clone();
        let model = field_model(&config, &["init", "constant", "linear"])?;
        let geometry = ctx.detector()?.model().clone();

        let sensor = geometry.thickness_domain();
        let domain = if config.has("depletion_depth") {
            let depth: f64 = config.get("depletion_depth")?;
            if depth <= 0.0 || depth > sensor.span() {
                return Err(config
                    .invalid_value(
                        "depletion_depth",
                        format!("must be in (0, {}] mm, got {depth}", sensor.span()),
                    )
                    .into());
            }
            ThicknessDomain::new(sensor.max - depth, sensor.max)
        } else {
            sensor
        };

        match model.as_str() {
            "init" => {
                let path = config.get_path("file_name", true)?;
                let data = ctx.field_cache().electric_fields().get_by_file_name(&path)?;
                let scale = grid_scale(data.size(), domain, &geometry);
                ctx.detector_mut()?
                    .set_electric_field_grid(data, scale, [0.0, 0.0], domain);
            }
            "constant" => {
                let bias: f64 = config.get("bias_voltage")?;
                log::trace!("Adding constant electric field of {bias} V");
                ctx.detector_mut()?.set_electric_field_function(
                    constant_field_function(bias, domain),
                    domain,
                    FieldType::Constant,
                );
            }
            _ => {
                let bias: f64 = config.get("bias_voltage")?;
                let depletion: f64 = config.get_or("depletion_voltage", bias)?;
                log::trace!("Adding linear electric field, bias {bias} V, depletion {depletion} V");
                ctx.detector_mut()?.set_electric_field_function(
                    linear_field_function(bias, depletion, domain),
                    domain,
                    FieldType::Linear,
                );
            }
        }
        Ok(())
    }

    fn run(&mut self, _ctx: &mut RunContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }
}
