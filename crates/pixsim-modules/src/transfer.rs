//! Induced charge from weighting potential differences.

use std::collections::BTreeMap;

use pixsim_core::{DetectorId, PixelIndex};
use pixsim_messenger::{MessageKind, PixelCharge, PropagatedCharge, Requirement};
use pixsim_module::{InitContext, Module, ModuleError, RunContext};

/// Converts propagated charges into charge induced on pixels.
///
/// For each propagated charge, every pixel in the 3x3 neighbourhood of
/// the pixel it ended in receives
/// `sign * charge * (phi(end) - phi(start))`, where `phi` is that
/// pixel's weighting potential. Holes arriving at a pixel therefore
/// induce positive charge on it. Charges ending outside the pixel matrix
/// are skipped. Requires a weighting potential on the detector.
pub struct PulseTransfer {
    detector: DetectorId,
}

impl PulseTransfer {
    /// Create a transfer module for `detector`.
    pub fn new(detector: impl Into<DetectorId>) -> Self {
        Self {
            detector: detector.into(),
        }
    }
}

impl Module for PulseTransfer {
    fn name(&self) -> &str {
        "PulseTransfer"
    }

    fn detector(&self) -> Option<&DetectorId> {
        Some(&self.detector)
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError> {
        ctx.subscribe_own(MessageKind::PropagatedCharge, Requirement::Required)?;
        ctx.publishes(MessageKind::PixelCharge)
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<(), ModuleError> {
        let detector = ctx.detector()?;
        let model = detector.model();
        let Some(message) = ctx.fetch(MessageKind::PropagatedCharge)? else {
            return Ok(());
        };
        let charges = message
            .data::<PropagatedCharge>()
            .ok_or_else(|| ModuleError::ExecutionFailed {
                reason: format!("unexpected records in {message}"),
            })?;

        let mut induced: BTreeMap<PixelIndex, f64> = BTreeMap::new();
        for propagated in charges {
            let Some(pixel) = model.pixel_at(propagated.local_position) else {
                log::trace!("Skipping charge outside the pixel matrix: {propagated}");
                continue;
            };
            let q = propagated.carrier.sign() * f64::from(propagated.charge);
            for neighbour in pixel.neighbourhood() {
                if !model.contains_pixel(neighbour) {
                    continue;
                }
                let end = detector.weighting_potential(propagated.local_position, neighbour)?;
                let start = detector.weighting_potential(propagated.initial_position, neighbour)?;
                *induced.entry(neighbour).or_insert(0.0) += q * (end - start);
            }
        }

        let pixels: Vec<PixelCharge> = induced
            .into_iter()
            .map(|(pixel, charge)| PixelCharge { pixel, charge })
            .collect();
        log::debug!("Induced charge on {} pixels of {}", pixels.len(), self.detector);
        ctx.dispatch(pixels)?;
        Ok(())
    }
}
