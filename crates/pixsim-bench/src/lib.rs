//! Benchmark profiles for the pixsim detector simulation framework.
//!
//! - [`timepix_model`]: 256x256 pixels, 55 µm pitch, 300 µm thick
//! - [`reference_profile`]: the full reference chain on one such sensor
//! - [`write_weighting_grid`]: a synthetic `init` weighting potential

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pixsim_core::{Configuration, Vector2};
use pixsim_detector::DetectorModel;
use pixsim_engine::SimulationConfig;
use pixsim_modules::{
    ElectricFieldReader, ProjectionPropagation, PulseTransfer, SimpleDeposition,
    WeightingPotentialReader,
};

/// A Timepix-like hybrid pixel sensor.
pub fn timepix_model() -> Arc<DetectorModel> {
    let model = DetectorModel::builder("timepix")
        .number_of_pixels(256, 256)
        .pixel_size(Vector2::new(0.055, 0.055))
        .implant_size(Vector2::new(0.05, 0.05))
        .sensor_thickness(0.3)
        .build();
    match model {
        Ok(model) => Arc::new(model),
        Err(reason) => panic!("benchmark model is invalid: {reason}"),
    }
}

/// Deposition, projection and pulse transfer on one sensor with a pad
/// weighting potential and a linear electric field.
pub fn reference_profile(seed: u64, charges: u32) -> SimulationConfig {
    SimulationConfig::new()
        .with_detector("dut", timepix_model())
        .with_module(
            WeightingPotentialReader::new("dut"),
            Configuration::new("WeightingPotentialReader").with("model", "pad"),
        )
        .with_module(
            ElectricFieldReader::new("dut"),
            Configuration::new("ElectricFieldReader")
                .with("model", "linear")
                .with("bias_voltage", "150")
                .with("depletion_voltage", "50"),
        )
        .with_module(
            SimpleDeposition::new("dut"),
            Configuration::new("SimpleDeposition")
                .with("number_of_charges", charges.to_string())
                .with("position", "7.0 7.0 0.0")
                .with("spread", "0.02")
                .with("seed", seed.to_string()),
        )
        .with_module(
            ProjectionPropagation::new("dut"),
            Configuration::new("ProjectionPropagation"),
        )
        .with_module(PulseTransfer::new("dut"), Configuration::new("PulseTransfer"))
}

/// Write an `nx x ny x nz` weighting potential spanning one pixel of
/// [`timepix_model`] into `dir`, rising linearly towards the readout.
pub fn write_weighting_grid(dir: &Path, nx: usize, ny: usize, nz: usize) -> std::io::Result<PathBuf> {
    let mut text = String::new();
    let _ = writeln!(text, "synthetic weighting potential");
    let _ = writeln!(text, "0 0\n0 0 1\n0 0 0\n300 55 55\n0 0 0 0");
    let _ = writeln!(text, "{nx} {ny} {nz} 0");
    for ix in 1..=nx {
        for iy in 1..=ny {
            for iz in 1..=nz {
                let _ = writeln!(text, "{ix} {iy} {iz} {}", iz as f64 / nz as f64);
            }
        }
    }
    let path = dir.join(format!("weights_{nx}x{ny}x{nz}.init"));
    std::fs::write(&path, text)?;
    Ok(path)
}
