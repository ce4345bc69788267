//! Messenger contract violations.

use std::error::Error;
use std::fmt;

use pixsim_core::{DetectorId, EventNumber, ModuleId};

use crate::message::MessageKind;

/// Errors raised by the [`Messenger`](crate::Messenger).
///
/// Violations during an event abandon that event only; the bus is reset
/// before the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessengerError {
    /// A second message of the same kind was dispatched for the same
    /// detector in one event.
    DuplicateProducer {
        /// Kind of the duplicated message.
        kind: MessageKind,
        /// Detector the messages were dispatched for.
        detector: Option<DetectorId>,
        /// The event.
        event: EventNumber,
        /// Module that dispatched first.
        first: ModuleId,
        /// Module whose dispatch was rejected.
        second: ModuleId,
    },
    /// A required message was not dispatched this event.
    NoMessage {
        /// Module that fetched.
        module: ModuleId,
        /// Requested kind.
        kind: MessageKind,
        /// Requested detector, `None` for a wildcard fetch.
        detector: Option<DetectorId>,
        /// The event.
        event: EventNumber,
    },
    /// The module fetched a kind it never subscribed to.
    NotSubscribed {
        /// Module that fetched.
        module: ModuleId,
        /// Requested kind.
        kind: MessageKind,
        /// Requested detector, `None` for a wildcard fetch.
        detector: Option<DetectorId>,
    },
    /// Subscriptions and publications can only be declared between
    /// events.
    SubscriptionClosed {
        /// Module that tried to declare.
        module: ModuleId,
        /// The event in progress.
        event: EventNumber,
    },
    /// A message was dispatched while no event was in progress.
    EventNotActive {
        /// Module that dispatched.
        module: ModuleId,
        /// Kind of the message.
        kind: MessageKind,
    },
}

impl fmt::Display for MessengerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateProducer {
                kind,
                detector,
                event,
                first,
                second,
            } => {
                write!(
                    f,
                    "module {second} dispatched {kind}{} in event {event}, already produced by module {first}",
                    for_detector(detector.as_ref())
                )
            }
            Self::NoMessage {
                module,
                kind,
                detector,
                event,
            } => {
                write!(
                    f,
                    "module {module} requires {kind}{} but none was dispatched in event {event}",
                    for_detector(detector.as_ref())
                )
            }
            Self::NotSubscribed {
                module,
                kind,
                detector,
            } => {
                write!(
                    f,
                    "module {module} is not subscribed to {kind}{}",
                    for_detector(detector.as_ref())
                )
            }
            Self::SubscriptionClosed { module, event } => {
                write!(
                    f,
                    "module {module} declared a subscription during event {event}"
                )
            }
            Self::EventNotActive { module, kind } => {
                write!(f, "module {module} dispatched {kind} outside of an event")
            }
        }
    }
}

impl Error for MessengerError {}

fn for_detector(detector: Option<&DetectorId>) -> String {
    match detector {
        Some(d) => format!(" for detector '{d}'"),
        None => String::new(),
    }
}
