//! [`Message`] and the closed set of message kinds.

use std::fmt;

use pixsim_core::{DetectorId, EventNumber, Object};

use crate::records::{DepositedCharge, PixelCharge, PropagatedCharge};

/// Tag of every message kind the pipeline knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    /// Carriers created in the sensor.
    DepositedCharge,
    /// Carriers after transport.
    PropagatedCharge,
    /// Charge induced per pixel.
    PixelCharge,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [MessageKind; 3] = [
        MessageKind::DepositedCharge,
        MessageKind::PropagatedCharge,
        MessageKind::PixelCharge,
    ];
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DepositedCharge => "DepositedCharge",
            Self::PropagatedCharge => "PropagatedCharge",
            Self::PixelCharge => "PixelCharge",
        };
        f.write_str(name)
    }
}

/// The records carried by a message, tagged by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Records {
    /// See [`DepositedCharge`].
    DepositedCharge(Vec<DepositedCharge>),
    /// See [`PropagatedCharge`].
    PropagatedCharge(Vec<PropagatedCharge>),
    /// See [`PixelCharge`].
    PixelCharge(Vec<PixelCharge>),
}

impl Records {
    /// The kind tag of these records.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::DepositedCharge(_) => MessageKind::DepositedCharge,
            Self::PropagatedCharge(_) => MessageKind::PropagatedCharge,
            Self::PixelCharge(_) => MessageKind::PixelCharge,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        match self {
            Self::DepositedCharge(v) => v.len(),
            Self::PropagatedCharge(v) => v.len(),
            Self::PixelCharge(v) => v.len(),
        }
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The records as trait objects, for kind-independent rendering.
    pub fn objects(&self) -> Vec<&dyn Object> {
        match self {
            Self::DepositedCharge(v) => v.iter().map(|r| r as &dyn Object).collect(),
            Self::PropagatedCharge(v) => v.iter().map(|r| r as &dyn Object).collect(),
            Self::PixelCharge(v) => v.iter().map(|r| r as &dyn Object).collect(),
        }
    }
}

/// A record type that can travel inside a [`Message`].
///
/// Implemented for every record in [`crate::records`]; the mapping to
/// [`Records`] variants is what keeps the kind set closed.
pub trait Record: Object + Clone {
    /// The kind tag of messages carrying this record.
    const KIND: MessageKind;

    /// Wrap a batch of records.
    fn into_records(records: Vec<Self>) -> Records;

    /// Borrow the batch if `records` holds this type.
    fn from_records(records: &Records) -> Option<&[Self]>;
}

macro_rules! impl_record {
    ($ty:ident) => {
        impl Record for $ty {
            const KIND: MessageKind = MessageKind::$ty;

            fn into_records(records: Vec<Self>) -> Records {
                Records::$ty(records)
            }

            fn from_records(records: &Records) -> Option<&[Self]> {
                match records {
                    Records::$ty(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_record!(DepositedCharge);
impl_record!(PropagatedCharge);
impl_record!(PixelCharge);

/// An immutable batch of records for one detector and one event.
///
/// The event number is stamped by the messenger when the message is
/// dispatched.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    detector: Option<DetectorId>,
    event: EventNumber,
    records: Records,
}

impl Message {
    /// Create a message for `detector`, or for no particular detector.
    pub fn new<R: Record>(detector: Option<DetectorId>, records: Vec<R>) -> Self {
        Self {
            detector,
            event: EventNumber(0),
            records: R::into_records(records),
        }
    }

    pub(crate) fn stamp(&mut self, event: EventNumber) {
        self.event = event;
    }

    /// Kind tag.
    pub fn kind(&self) -> MessageKind {
        self.records.kind()
    }

    /// The detector the records belong to.
    pub fn detector(&self) -> Option<&DetectorId> {
        self.detector.as_ref()
    }

    /// The event the message was dispatched in.
    pub fn event(&self) -> EventNumber {
        self.event
    }

    /// The tagged records.
    pub fn records(&self) -> &Records {
        &self.records
    }

    /// The records as `R`, or `None` if the message carries another kind.
    pub fn data<R: Record>(&self) -> Option<&[R]> {
        R::from_records(&self.records)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.kind(), self.records.len())?;
        if let Some(detector) = &self.detector {
            write!(f, " for {detector}")?;
        }
        write!(f, " in event {}", self.event)
    }
}
