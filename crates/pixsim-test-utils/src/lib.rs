//! Test utilities and mock modules for pixsim development.
//!
//! Provides a standard detector model, a scriptable [`MockModule`] for
//! exercising the engine, and a [`CaptureModule`] that records every
//! message of one kind for later inspection.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Once};

use pixsim_core::Vector2;
use pixsim_detector::DetectorModel;

pub use fixtures::{CallLog, CaptureModule, Captured, MockModule};

/// Pitch of [`test_model`], in mm.
pub const TEST_PITCH: f64 = 0.055;
/// Sensor thickness of [`test_model`], in mm.
pub const TEST_THICKNESS: f64 = 0.2;

/// A 16x16 pixel sensor with 55 µm pitch, 50 µm implants and 200 µm
/// thickness.
pub fn test_model() -> Arc<DetectorModel> {
    let model = DetectorModel::builder("test")
        .number_of_pixels(16, 16)
        .pixel_size(Vector2::new(TEST_PITCH, TEST_PITCH))
        .implant_size(Vector2::new(0.05, 0.05))
        .sensor_thickness(TEST_THICKNESS)
        .build();
    match model {
        Ok(model) => Arc::new(model),
        Err(reason) => panic!("test model is invalid: {reason}"),
    }
}

static LOGGING: Once = Once::new();

/// Route `log` output through `env_logger` for the current test binary.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
