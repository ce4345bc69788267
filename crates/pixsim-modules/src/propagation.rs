//! Straight-line projection of deposited charge onto the readout plane.

use pixsim_core::{DetectorId, Point3};
use pixsim_messenger::{DepositedCharge, MessageKind, PropagatedCharge, Requirement};
use pixsim_module::{InitContext, Module, ModuleError, RunContext};

/// Moves every deposit to the readout plane along its drift direction.
///
/// Holes drift along the electric field and electrons against it. A
/// carrier is collected when its drift has a component towards the
/// readout plane; it is then projected in a straight line from where it
/// was deposited onto the plane. Carriers that drift away from the
/// readout, or sit where the field is zero, are dropped.
///
/// Requires an electric field on the detector.
pub struct ProjectionPropagation {
    detector: DetectorId,
}

impl ProjectionPropagation {
    /// Create a propagation module for `detector`.
    pub fn new(detector: impl Into<DetectorId>) -> Self {
        Self {
            detector: detector.into(),
        }
    }
}

impl Module for ProjectionPropagation {
    fn name(&self) -> &str {
        "ProjectionPropagation"
    }

    fn detector(&self) -> Option<&DetectorId> {
        Some(&self.detector)
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError> {
        ctx.subscribe_own(MessageKind::DepositedCharge, Requirement::Required)?;
        ctx.publishes(MessageKind::PropagatedCharge)
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<(), ModuleError> {
        let detector = ctx.detector()?;
        let readout = detector.model().thickness_domain().max;
        let message = ctx
            .fetch(MessageKind::DepositedCharge)?
            .ok_or(ModuleError::ExecutionFailed {
                reason: "deposited charge missing".into(),
            })?;
        let deposits = message
            .data::<DepositedCharge>()
            .ok_or_else(|| ModuleError::ExecutionFailed {
                reason: format!("unexpected records in {message}"),
            })?;

        let mut propagated = Vec::with_capacity(deposits.len());
        let mut lost = 0u64;
        for deposit in deposits {
            let start = deposit.local_position;
            let drift = detector.electric_field_at(start)? * deposit.carrier.sign();
            if drift.z <= 0.0 {
                lost += u64::from(deposit.charge);
                continue;
            }
            let t = (readout - start.z) / drift.z;
            let end = Point3::new(start.x + drift.x * t, start.y + drift.y * t, readout);
            propagated.push(PropagatedCharge {
                initial_position: start,
                local_position: end,
                charge: deposit.charge,
                carrier: deposit.carrier,
                event_time: deposit.event_time,
            });
        }

        log::debug!(
            "Propagated {} charge sets in {}, {lost} charges not collected",
            propagated.len(),
            self.detector
        );
        ctx.dispatch(propagated)?;
        Ok(())
    }
}
