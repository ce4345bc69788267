//! Reference modules for the pixsim detector simulation framework.
//!
//! Two field readers configure the detectors during initialization; the
//! remaining modules form a minimal charge-transport chain.
//!
//! # Pipeline order (each event)
//!
//! 1. [`SimpleDeposition`]: publishes `DepositedCharge`
//! 2. [`ProjectionPropagation`]: `DepositedCharge` → `PropagatedCharge`
//! 3. [`PulseTransfer`]: `PropagatedCharge` → `PixelCharge`
//!
//! [`WeightingPotentialReader`] and [`ElectricFieldReader`] only act in
//! `initialize` and do nothing per event.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod deposition;
pub mod electric_field;
pub mod propagation;
pub mod transfer;
pub mod weighting_potential;

pub use deposition::SimpleDeposition;
pub use electric_field::ElectricFieldReader;
pub use propagation::ProjectionPropagation;
pub use transfer::PulseTransfer;
pub use weighting_potential::{PotentialProfile, WeightingPotentialReader};

use pixsim_core::{Configuration, ThicknessDomain};
use pixsim_detector::DetectorModel;
use pixsim_field::check_detector_match;
use pixsim_module::ModuleError;

/// Per-axis grid scale for a table of extent `size` on `model`, after
/// warning about any geometry mismatch.
fn grid_scale(size: [f64; 3], domain: ThicknessDomain, model: &DetectorModel) -> [f64; 2] {
    let pitch = model.pixel_size();
    check_detector_match(size, domain, pitch);
    [size[0] / pitch.x, size[1] / pitch.y]
}

/// Read the `model` key and reject anything outside `allowed`.
fn field_model(config: &Configuration, allowed: &[&str]) -> Result<String, ModuleError> {
    let model: String = config.get("model")?;
    if allowed.contains(&model.as_str()) {
        Ok(model)
    } else {
        let expected = allowed
            .iter()
            .map(|m| format!("'{m}'"))
            .collect::<Vec<_>>()
            .join(" or ");
        Err(config
            .invalid_value("model", format!("model should be {expected}, got '{model}'"))
            .into())
    }
}
