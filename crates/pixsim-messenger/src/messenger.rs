//! The [`Messenger`] registry and per-event message store.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use pixsim_core::{DetectorId, EventNumber, ModuleId};
use smallvec::SmallVec;

use crate::error::MessengerError;
use crate::message::{Message, MessageKind};

/// Which detectors a subscription or publication covers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DetectorScope {
    /// Messages for any detector.
    Any,
    /// Messages for one detector.
    Detector(DetectorId),
}

impl DetectorScope {
    /// Whether a message for `detector` falls in this scope.
    ///
    /// Messages that belong to no detector match every scope.
    pub fn matches(&self, detector: Option<&DetectorId>) -> bool {
        match (self, detector) {
            (Self::Any, _) | (_, None) => true,
            (Self::Detector(own), Some(d)) => own == d,
        }
    }
}

impl fmt::Display for DetectorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Detector(d) => write!(f, "{d}"),
        }
    }
}

/// Whether a module can run without a subscribed message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Requirement {
    /// The module cannot run without the message.
    Required,
    /// The module runs with or without the message.
    Optional,
}

/// A declared interest in a message kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    /// Subscribing module.
    pub module: ModuleId,
    /// Kind of message.
    pub kind: MessageKind,
    /// Detectors covered.
    pub scope: DetectorScope,
    /// Whether the message must be present.
    pub requirement: Requirement,
}

/// A declared intent to dispatch a message kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Publication {
    /// Publishing module.
    pub module: ModuleId,
    /// Kind of message.
    pub kind: MessageKind,
    /// Detectors the messages will be dispatched for.
    pub scope: DetectorScope,
}

type SubscriptionKey = (ModuleId, MessageKind, DetectorScope);
type MessageKey = (MessageKind, Option<DetectorId>);

/// Subscription registry and per-event message store.
///
/// Declarations ([`subscribe`](Self::subscribe),
/// [`declare_publication`](Self::declare_publication)) are accepted only
/// outside events. Within an event, each `(kind, detector)` pair may be
/// dispatched once; the store is cleared by
/// [`begin_event`](Self::begin_event) and [`end_event`](Self::end_event).
#[derive(Debug, Default)]
pub struct Messenger {
    subscriptions: IndexMap<SubscriptionKey, Requirement>,
    publications: Vec<Publication>,
    current_event: Option<EventNumber>,
    messages: IndexMap<MessageKey, (ModuleId, Arc<Message>)>,
}

impl Messenger {
    /// Create an empty messenger.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Declarations ────────────────────────────────────────────

    /// Register interest of `module` in messages of `kind` within
    /// `scope`.
    ///
    /// Repeating a subscription is a no-op, except that `Required` takes
    /// precedence over `Optional`.
    pub fn subscribe(
        &mut self,
        module: ModuleId,
        kind: MessageKind,
        scope: DetectorScope,
        requirement: Requirement,
    ) -> Result<(), MessengerError> {
        self.ensure_open(module)?;
        log::trace!("Module {module} subscribes to {kind} for {scope} ({requirement:?})");
        self.subscriptions
            .entry((module, kind, scope))
            .and_modify(|existing| *existing = (*existing).min(requirement))
            .or_insert(requirement);
        Ok(())
    }

    /// Declare that `module` will dispatch messages of `kind` within
    /// `scope`. Used to compute the execution order.
    pub fn declare_publication(
        &mut self,
        module: ModuleId,
        kind: MessageKind,
        scope: DetectorScope,
    ) -> Result<(), MessengerError> {
        self.ensure_open(module)?;
        let publication = Publication {
            module,
            kind,
            scope,
        };
        if !self.publications.contains(&publication) {
            self.publications.push(publication);
        }
        Ok(())
    }

    /// Every subscription, in declaration order.
    pub fn subscriptions(&self) -> impl Iterator<Item = Subscription> + '_ {
        self.subscriptions
            .iter()
            .map(|((module, kind, scope), requirement)| Subscription {
                module: *module,
                kind: *kind,
                scope: scope.clone(),
                requirement: *requirement,
            })
    }

    /// Every declared publication, in declaration order.
    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    fn ensure_open(&self, module: ModuleId) -> Result<(), MessengerError> {
        match self.current_event {
            Some(event) => Err(MessengerError::SubscriptionClosed { module, event }),
            None => Ok(()),
        }
    }

    // ── Event lifecycle ─────────────────────────────────────────

    /// Start `event` with an empty store.
    pub fn begin_event(&mut self, event: EventNumber) {
        self.messages.clear();
        self.current_event = Some(event);
    }

    /// Finish the current event and drop its messages.
    ///
    /// Returns the number of messages dispatched during the event.
    pub fn end_event(&mut self) -> usize {
        let dispatched = self.messages.len();
        self.messages.clear();
        self.current_event = None;
        dispatched
    }

    /// The event in progress, if any.
    pub fn current_event(&self) -> Option<EventNumber> {
        self.current_event
    }

    /// Messages dispatched so far in the current event.
    pub fn dispatched_count(&self) -> usize {
        self.messages.len()
    }

    // ── Dispatch and fetch ──────────────────────────────────────

    /// Publish `message` from `module` for the current event.
    ///
    /// The message becomes visible to every later [`fetch`](Self::fetch)
    /// by a module subscribed to its kind and detector.
    pub fn dispatch(
        &mut self,
        module: ModuleId,
        mut message: Message,
    ) -> Result<Arc<Message>, MessengerError> {
        let kind = message.kind();
        let event = self
            .current_event
            .ok_or(MessengerError::EventNotActive { module, kind })?;
        let key = (kind, message.detector().cloned());
        if let Some(first) = self.producer_overlapping(&key) {
            return Err(MessengerError::DuplicateProducer {
                kind,
                detector: key.1,
                event,
                first,
                second: module,
            });
        }

        message.stamp(event);
        let message = Arc::new(message);
        log::debug!("Module {module} dispatched {message}");
        self.messages.insert(key, (module, Arc::clone(&message)));
        Ok(message)
    }

    /// Producer of a message already visible wherever a message keyed by
    /// `key` would be. A detector-less message overlaps every detector.
    fn producer_overlapping(&self, key: &MessageKey) -> Option<ModuleId> {
        let (kind, detector) = key;
        let existing = match detector {
            Some(_) => self
                .messages
                .get(key)
                .or_else(|| self.messages.get(&(*kind, None))),
            None => self
                .messages
                .iter()
                .find(|((k, _), _)| k == kind)
                .map(|(_, entry)| entry),
        };
        existing.map(|(first, _)| *first)
    }

    /// The message of `kind` for `detector` dispatched this event.
    ///
    /// A message dispatched for no particular detector satisfies a fetch
    /// for any detector. Returns `Ok(None)` when nothing was dispatched
    /// and the subscription is optional.
    pub fn fetch(
        &self,
        module: ModuleId,
        kind: MessageKind,
        detector: &DetectorId,
    ) -> Result<Option<Arc<Message>>, MessengerError> {
        let requirement = self
            .requirement_for(module, kind, Some(detector))
            .ok_or_else(|| MessengerError::NotSubscribed {
                module,
                kind,
                detector: Some(detector.clone()),
            })?;

        let found = self
            .messages
            .get(&(kind, Some(detector.clone())))
            .or_else(|| self.messages.get(&(kind, None)))
            .map(|(_, message)| Arc::clone(message));

        match (found, requirement) {
            (Some(message), _) => Ok(Some(message)),
            (None, Requirement::Optional) => Ok(None),
            (None, Requirement::Required) => Err(MessengerError::NoMessage {
                module,
                kind,
                detector: Some(detector.clone()),
                event: self.current_event.unwrap_or(EventNumber(0)),
            }),
        }
    }

    /// Every message of `kind` dispatched this event, for any detector.
    ///
    /// Requires a subscription with [`DetectorScope::Any`].
    pub fn fetch_all(
        &self,
        module: ModuleId,
        kind: MessageKind,
    ) -> Result<SmallVec<[Arc<Message>; 4]>, MessengerError> {
        let requirement = self
            .subscriptions
            .get(&(module, kind, DetectorScope::Any))
            .copied()
            .ok_or(MessengerError::NotSubscribed {
                module,
                kind,
                detector: None,
            })?;

        let found: SmallVec<[Arc<Message>; 4]> = self
            .messages
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, (_, message))| Arc::clone(message))
            .collect();

        if found.is_empty() && requirement == Requirement::Required {
            return Err(MessengerError::NoMessage {
                module,
                kind,
                detector: None,
                event: self.current_event.unwrap_or(EventNumber(0)),
            });
        }
        Ok(found)
    }

    /// The strictest requirement among the subscriptions of `module` to
    /// `kind` that cover `detector`.
    fn requirement_for(
        &self,
        module: ModuleId,
        kind: MessageKind,
        detector: Option<&DetectorId>,
    ) -> Option<Requirement> {
        self.subscriptions
            .iter()
            .filter(|((m, k, scope), _)| *m == module && *k == kind && scope.matches(detector))
            .map(|(_, requirement)| *requirement)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CarrierType, DepositedCharge, PixelCharge};
    use pixsim_core::{PixelIndex, Point3};

    const PRODUCER: ModuleId = ModuleId(0);
    const CONSUMER: ModuleId = ModuleId(1);

    fn det(name: &str) -> DetectorId {
        DetectorId::new(name)
    }

    fn deposits(detector: &str) -> Message {
        Message::new(
            Some(det(detector)),
            vec![DepositedCharge {
                local_position: Point3::origin(),
                charge: 10,
                carrier: CarrierType::Electron,
                event_time: 0.0,
            }],
        )
    }

    fn scope(name: &str) -> DetectorScope {
        DetectorScope::Detector(det(name))
    }

    #[test]
    fn duplicate_dispatch_for_same_detector_fails() {
        let mut m = Messenger::new();
        m.begin_event(EventNumber(1));
        m.dispatch(PRODUCER, deposits("a")).unwrap();
        let err = m.dispatch(CONSUMER, deposits("a")).unwrap_err();
        assert_eq!(
            err,
            MessengerError::DuplicateProducer {
                kind: MessageKind::DepositedCharge,
                detector: Some(det("a")),
                event: EventNumber(1),
                first: PRODUCER,
                second: CONSUMER,
            }
        );
    }

    #[test]
    fn detectorless_and_detector_messages_conflict() {
        let mut m = Messenger::new();
        m.begin_event(EventNumber(1));
        m.dispatch(PRODUCER, Message::new(None, Vec::<DepositedCharge>::new()))
            .unwrap();
        let err = m.dispatch(CONSUMER, deposits("a")).unwrap_err();
        assert_eq!(
            err,
            MessengerError::DuplicateProducer {
                kind: MessageKind::DepositedCharge,
                detector: Some(det("a")),
                event: EventNumber(1),
                first: PRODUCER,
                second: CONSUMER,
            }
        );

        m.begin_event(EventNumber(2));
        m.dispatch(PRODUCER, deposits("b")).unwrap();
        let err = m
            .dispatch(CONSUMER, Message::new(None, Vec::<DepositedCharge>::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            MessengerError::DuplicateProducer { detector: None, first: PRODUCER, .. }
        ));
        assert_eq!(m.dispatched_count(), 1);
    }

    #[test]
    fn dispatch_for_two_detectors_succeeds() {
        let mut m = Messenger::new();
        m.begin_event(EventNumber(1));
        m.dispatch(PRODUCER, deposits("a")).unwrap();
        m.dispatch(PRODUCER, deposits("b")).unwrap();
        assert_eq!(m.dispatched_count(), 2);
    }

    #[test]
    fn required_fetch_without_dispatch_fails() {
        let mut m = Messenger::new();
        m.subscribe(CONSUMER, MessageKind::DepositedCharge, scope("a"), Requirement::Required)
            .unwrap();
        m.begin_event(EventNumber(3));
        let err = m
            .fetch(CONSUMER, MessageKind::DepositedCharge, &det("a"))
            .unwrap_err();
        assert!(matches!(err, MessengerError::NoMessage { event: EventNumber(3), .. }));
    }

    #[test]
    fn optional_fetch_without_dispatch_is_empty() {
        let mut m = Messenger::new();
        m.subscribe(CONSUMER, MessageKind::DepositedCharge, scope("a"), Requirement::Optional)
            .unwrap();
        m.begin_event(EventNumber(1));
        assert_eq!(m.fetch(CONSUMER, MessageKind::DepositedCharge, &det("a")), Ok(None));
    }

    #[test]
    fn fetch_shares_the_dispatched_message() {
        let mut m = Messenger::new();
        m.subscribe(CONSUMER, MessageKind::DepositedCharge, scope("a"), Requirement::Required)
            .unwrap();
        m.begin_event(EventNumber(2));
        let sent = m.dispatch(PRODUCER, deposits("a")).unwrap();
        let got = m
            .fetch(CONSUMER, MessageKind::DepositedCharge, &det("a"))
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&sent, &got));
        assert_eq!(got.event(), EventNumber(2));
    }

    #[test]
    fn fetch_ignores_other_detectors() {
        let mut m = Messenger::new();
        m.subscribe(CONSUMER, MessageKind::DepositedCharge, scope("a"), Requirement::Optional)
            .unwrap();
        m.begin_event(EventNumber(1));
        m.dispatch(PRODUCER, deposits("b")).unwrap();
        assert_eq!(m.fetch(CONSUMER, MessageKind::DepositedCharge, &det("a")), Ok(None));
    }

    #[test]
    fn detectorless_message_reaches_every_detector() {
        let mut m = Messenger::new();
        m.subscribe(CONSUMER, MessageKind::PixelCharge, scope("a"), Requirement::Required)
            .unwrap();
        m.begin_event(EventNumber(1));
        let msg = Message::new(
            None,
            vec![PixelCharge {
                pixel: PixelIndex::new(0, 0),
                charge: 1.0,
            }],
        );
        m.dispatch(PRODUCER, msg).unwrap();
        assert!(m
            .fetch(CONSUMER, MessageKind::PixelCharge, &det("a"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn unsubscribed_fetch_fails() {
        let mut m = Messenger::new();
        m.begin_event(EventNumber(1));
        assert!(matches!(
            m.fetch(CONSUMER, MessageKind::DepositedCharge, &det("a")),
            Err(MessengerError::NotSubscribed { .. })
        ));
        assert!(matches!(
            m.fetch_all(CONSUMER, MessageKind::DepositedCharge),
            Err(MessengerError::NotSubscribed { detector: None, .. })
        ));
    }

    #[test]
    fn subscriptions_close_during_events() {
        let mut m = Messenger::new();
        m.begin_event(EventNumber(5));
        let err = m
            .subscribe(CONSUMER, MessageKind::DepositedCharge, DetectorScope::Any, Requirement::Optional)
            .unwrap_err();
        assert_eq!(
            err,
            MessengerError::SubscriptionClosed {
                module: CONSUMER,
                event: EventNumber(5)
            }
        );
        assert!(m
            .declare_publication(PRODUCER, MessageKind::DepositedCharge, DetectorScope::Any)
            .is_err());
        m.end_event();
        assert!(m
            .subscribe(CONSUMER, MessageKind::DepositedCharge, DetectorScope::Any, Requirement::Optional)
            .is_ok());
    }

    #[test]
    fn repeated_subscription_is_idempotent_and_required_wins() {
        let mut m = Messenger::new();
        for requirement in [Requirement::Optional, Requirement::Required, Requirement::Optional] {
            m.subscribe(CONSUMER, MessageKind::DepositedCharge, scope("a"), requirement)
                .unwrap();
        }
        let subs: Vec<_> = m.subscriptions().collect();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].requirement, Requirement::Required);
    }

    #[test]
    fn dispatch_outside_event_fails() {
        let mut m = Messenger::new();
        assert!(matches!(
            m.dispatch(PRODUCER, deposits("a")),
            Err(MessengerError::EventNotActive { .. })
        ));
    }

    #[test]
    fn event_boundary_clears_messages() {
        let mut m = Messenger::new();
        m.subscribe(CONSUMER, MessageKind::DepositedCharge, scope("a"), Requirement::Optional)
            .unwrap();
        m.begin_event(EventNumber(1));
        m.dispatch(PRODUCER, deposits("a")).unwrap();
        assert_eq!(m.end_event(), 1);

        m.begin_event(EventNumber(2));
        assert_eq!(m.fetch(CONSUMER, MessageKind::DepositedCharge, &det("a")), Ok(None));
        // Same producer may dispatch again in the new event.
        assert!(m.dispatch(PRODUCER, deposits("a")).is_ok());
    }

    #[test]
    fn wildcard_fetch_collects_every_detector() {
        let mut m = Messenger::new();
        m.subscribe(CONSUMER, MessageKind::DepositedCharge, DetectorScope::Any, Requirement::Required)
            .unwrap();
        m.begin_event(EventNumber(1));
        assert!(matches!(
            m.fetch_all(CONSUMER, MessageKind::DepositedCharge),
            Err(MessengerError::NoMessage { detector: None, .. })
        ));
        m.dispatch(PRODUCER, deposits("a")).unwrap();
        m.dispatch(PRODUCER, deposits("b")).unwrap();
        let all = m.fetch_all(CONSUMER, MessageKind::DepositedCharge).unwrap();
        assert_eq!(all.len(), 2);
        // The wildcard subscription also covers single-detector fetches.
        assert!(m
            .fetch(CONSUMER, MessageKind::DepositedCharge, &det("b"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn publications_are_deduplicated() {
        let mut m = Messenger::new();
        for _ in 0..3 {
            m.declare_publication(PRODUCER, MessageKind::PixelCharge, scope("a"))
                .unwrap();
        }
        assert_eq!(m.publications().len(), 1);
    }
}
