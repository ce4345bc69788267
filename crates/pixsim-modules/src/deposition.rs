//! Point-like charge deposition.
//!
//! Each event, `number_of_charges` electron-hole pairs are created
//! around `position`, each coordinate smeared uniformly by up to
//! `spread`. Pairs that fall outside the sensor are dropped.
//!
//! Uses a ChaCha8 RNG seeded from `seed XOR event`, so a given seed
//! reproduces the same deposits for the same event number regardless
//! of which other events were run.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use pixsim_core::{DetectorId, Point3, Vector3};
use pixsim_messenger::{CarrierType, DepositedCharge, MessageKind};
use pixsim_module::{InitContext, Module, ModuleError, RunContext};

/// Publishes `DepositedCharge` for its detector every event.
///
/// # Configuration
///
/// | key | default | meaning |
/// |---|---|---|
/// | `number_of_charges` | `1000` | electron-hole pairs per event |
/// | `position` | `0 0 0` | centre of the deposit, local frame, mm |
/// | `spread` | `0` | half-width of the uniform smearing, mm |
/// | `seed` | `0` | RNG seed |
pub struct SimpleDeposition {
    detector: DetectorId,
    number_of_charges: u32,
    position: Point3,
    spread: f64,
    seed: u64,
}

impl SimpleDeposition {
    /// Create a deposition module for `detector`.
    pub fn new(detector: impl Into<DetectorId>) -> Self {
        Self {
            detector: detector.into(),
            number_of_charges: 1000,
            position: Point3::origin(),
            spread: 0.0,
            seed: 0,
        }
    }

    fn offset(&self, rng: &mut ChaCha8Rng) -> Vector3 {
        if self.spread == 0.0 {
            return Vector3::new(0.0, 0.0, 0.0);
        }
        let mut smear = || (rng.random::<f64>() * 2.0 - 1.0) * self.spread;
        Vector3::new(smear(), smear(), smear())
    }
}

impl Module for SimpleDeposition {
    fn name(&self) -> &str {
        "SimpleDeposition"
    }

    fn detector(&self) -> Option<&DetectorId> {
        Some(&self.detector)
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError> {
        let config = ctx.config();
        self.number_of_charges = config.get_or("number_of_charges", self.number_of_charges)?;
        self.position = config.get_or("position", self.position)?;
        self.spread = config.get_or("spread", self.spread)?;
        self.seed = config.get_or("seed", self.seed)?;

        if self.number_of_charges == 0 {
            return Err(config.invalid_value("number_of_charges", "must be at least 1").into());
        }
        if self.spread < 0.0 {
            return Err(config.invalid_value("spread", "must not be negative").into());
        }
        if !ctx.detector()?.model().is_within_sensor(self.position) {
            return Err(ctx
                .config()
                .invalid_value("position", format!("{} is outside the sensor", self.position))
                .into());
        }
        ctx.publishes(MessageKind::DepositedCharge)
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<(), ModuleError> {
        let model = ctx.detector()?.model();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ ctx.event().0);

        let mut deposits = Vec::with_capacity(2 * self.number_of_charges as usize);
        for _ in 0..self.number_of_charges {
            let at = self.position + self.offset(&mut rng);
            if !model.is_within_sensor(at) {
                continue;
            }
            for carrier in [CarrierType::Electron, CarrierType::Hole] {
                deposits.push(DepositedCharge {
                    local_position: at,
                    charge: 1,
                    carrier,
                    event_time: 0.0,
                });
            }
        }

        log::debug!(
            "Deposited {} charges in {} (event {})",
            deposits.len(),
            self.detector,
            ctx.event()
        );
        ctx.dispatch(deposits)?;
        Ok(())
    }
}
