//! Record types carried inside messages.
//!
//! Positions are in the detector's local frame, in millimetres. Charges
//! count elementary charges.

use std::fmt;

use pixsim_core::{Object, PixelIndex, Point3};

/// Sign of a charge carrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CarrierType {
    /// Negative carrier, drifts towards positive potential.
    Electron,
    /// Positive carrier.
    Hole,
}

impl CarrierType {
    /// Charge sign: -1 for electrons, +1 for holes.
    pub fn sign(self) -> f64 {
        match self {
            Self::Electron => -1.0,
            Self::Hole => 1.0,
        }
    }
}

impl fmt::Display for CarrierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Electron => f.write_str("electron"),
            Self::Hole => f.write_str("hole"),
        }
    }
}

/// A set of carriers created at one point in the sensor.
#[derive(Clone, Debug, PartialEq)]
pub struct DepositedCharge {
    /// Where the carriers were created.
    pub local_position: Point3,
    /// Number of carriers.
    pub charge: u32,
    /// Carrier type.
    pub carrier: CarrierType,
    /// Creation time in ns after the start of the event.
    pub event_time: f64,
}

impl fmt::Display for DepositedCharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}s at {} (t={} ns)",
            self.charge, self.carrier, self.local_position, self.event_time
        )
    }
}

impl Object for DepositedCharge {
    fn type_name(&self) -> &'static str {
        "DepositedCharge"
    }
}

/// A set of carriers after transport through the sensor.
#[derive(Clone, Debug, PartialEq)]
pub struct PropagatedCharge {
    /// Where the carriers started.
    pub initial_position: Point3,
    /// Where the carriers ended.
    pub local_position: Point3,
    /// Number of carriers.
    pub charge: u32,
    /// Carrier type.
    pub carrier: CarrierType,
    /// Arrival time in ns after the start of the event.
    pub event_time: f64,
}

impl fmt::Display for PropagatedCharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}s from {} to {} (t={} ns)",
            self.charge, self.carrier, self.initial_position, self.local_position, self.event_time
        )
    }
}

impl Object for PropagatedCharge {
    fn type_name(&self) -> &'static str {
        "PropagatedCharge"
    }
}

/// Charge induced on one pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelCharge {
    /// The pixel.
    pub pixel: PixelIndex,
    /// Induced charge in elementary charges; signed.
    pub charge: f64,
}

impl fmt::Display for PixelCharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} e on pixel {}", self.charge, self.pixel)
    }
}

impl Object for PixelCharge {
    fn type_name(&self) -> &'static str {
        "PixelCharge"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_render_through_object() {
        let d = DepositedCharge {
            local_position: Point3::new(0.0, 0.0, 0.1),
            charge: 80,
            carrier: CarrierType::Electron,
            event_time: 0.0,
        };
        assert!(d.describe().starts_with("DepositedCharge: 80 electrons"));

        let p = PixelCharge {
            pixel: PixelIndex::new(3, 4),
            charge: -12.5,
        };
        assert_eq!(p.type_name(), "PixelCharge");
        assert!(p.describe().contains("-12.5"));
    }

    #[test]
    fn carrier_signs() {
        assert_eq!(CarrierType::Electron.sign(), -1.0);
        assert_eq!(CarrierType::Hole.sign(), 1.0);
    }
}
