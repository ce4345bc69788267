//! Publish/subscribe bus for per-event data products.
//!
//! Modules exchange [`Message`]s, each an immutable batch of records of
//! one [`MessageKind`] produced for one detector in one event. The set of
//! kinds is closed: every record type is declared in [`records`] and
//! tagged in [`MessageKind`], so the bus never needs dynamic type
//! inspection.
//!
//! The [`Messenger`] holds subscriptions declared during initialization
//! and the messages dispatched during the current event. Messages are
//! shared by `Arc`, never copied, and the bus is cleared at every event
//! boundary.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod message;
pub mod messenger;
pub mod records;

pub use error::MessengerError;
pub use message::{Message, MessageKind, Record, Records};
pub use messenger::{DetectorScope, Messenger, Publication, Requirement, Subscription};
pub use records::{CarrierType, DepositedCharge, PixelCharge, PropagatedCharge};
