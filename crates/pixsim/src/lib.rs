//! pixsim: a modular silicon pixel detector simulation framework.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all pixsim sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use pixsim::prelude::*;
//!
//! let model = DetectorModel::builder("timepix")
//!     .number_of_pixels(16, 16)
//!     .pixel_size(Vector2::new(0.055, 0.055))
//!     .implant_size(Vector2::new(0.05, 0.05))
//!     .sensor_thickness(0.2)
//!     .build()
//!     .unwrap();
//!
//! let config = SimulationConfig::new()
//!     .with_detector("dut", Arc::new(model))
//!     .with_module(
//!         WeightingPotentialReader::new("dut"),
//!         Configuration::new("WeightingPotentialReader").with("model", "pad"),
//!     )
//!     .with_module(
//!         ElectricFieldReader::new("dut"),
//!         Configuration::new("ElectricFieldReader")
//!             .with("model", "constant")
//!             .with("bias_voltage", "100"),
//!     )
//!     .with_module(
//!         SimpleDeposition::new("dut"),
//!         Configuration::new("SimpleDeposition").with("number_of_charges", "50"),
//!     )
//!     .with_module(ProjectionPropagation::new("dut"), Configuration::new("ProjectionPropagation"))
//!     .with_module(PulseTransfer::new("dut"), Configuration::new("PulseTransfer"));
//!
//! let mut sim = Simulation::new(config).unwrap();
//! let summary = sim.run(5);
//! assert_eq!(summary.events_completed, 5);
//! sim.finalize().unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `pixsim-core` | IDs, geometry, `Object`, `Configuration` |
//! | [`field`] | `pixsim-field` | Grid tables, the `init` parser, the field cache, analytic fields |
//! | [`detector`] | `pixsim-detector` | Detector geometry and field queries |
//! | [`messenger`] | `pixsim-messenger` | Records, messages and the message bus |
//! | [`module`] | `pixsim-module` | The `Module` trait, contexts, execution order |
//! | [`engine`] | `pixsim-engine` | The `Simulation` driver |
//! | [`modules`] | `pixsim-modules` | Reference modules |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers, geometry primitives and configuration (`pixsim-core`).
pub use pixsim_core as types;

/// Field tables and analytic fields (`pixsim-field`).
///
/// [`field::FieldCache`] shares parsed `init` files between every module
/// of one simulation.
pub use pixsim_field as field;

/// Detector geometry and the field query surface (`pixsim-detector`).
pub use pixsim_detector as detector;

/// Message records and the publish/subscribe bus (`pixsim-messenger`).
pub use pixsim_messenger as messenger;

/// The [`module::Module`] trait and its contexts (`pixsim-module`).
pub use pixsim_module as module;

/// The simulation driver (`pixsim-engine`).
pub use pixsim_engine as engine;

/// Reference modules (`pixsim-modules`).
pub use pixsim_modules as modules;

/// Common imports for typical pixsim usage.
///
/// ```rust
/// use pixsim::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use pixsim_core::{
        Configuration, DetectorId, EventNumber, ModuleId, PixelIndex, Point2, Point3,
        ThicknessDomain, Vector2, Vector3,
    };

    // Fields and detectors
    pub use pixsim_detector::{Detector, DetectorModel, FieldKind};
    pub use pixsim_field::{FieldCache, FieldType};

    // Messages
    pub use pixsim_messenger::{
        CarrierType, DepositedCharge, DetectorScope, Message, MessageKind, PixelCharge,
        PropagatedCharge, Requirement,
    };

    // Modules
    pub use pixsim_module::{FinalizeContext, InitContext, Module, RunContext};

    // Errors
    pub use pixsim_core::ConfigError;
    pub use pixsim_detector::FieldQueryError;
    pub use pixsim_engine::{EventError, SetupError};
    pub use pixsim_field::FieldFileError;
    pub use pixsim_messenger::MessengerError;
    pub use pixsim_module::ModuleError;

    // Engine
    pub use pixsim_engine::{RunSummary, Simulation, SimulationConfig};

    // Reference modules
    pub use pixsim_modules::{
        ElectricFieldReader, ProjectionPropagation, PulseTransfer, SimpleDeposition,
        WeightingPotentialReader,
    };
}
