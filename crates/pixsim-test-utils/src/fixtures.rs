//! Reusable module fixtures.
//!
//! - [`MockModule`]: declares the messages it is told to, publishes
//!   empty records, and fails on demand.
//! - [`CaptureModule`]: keeps every message of one kind it receives.

use std::sync::{Arc, Mutex, MutexGuard};

use pixsim_core::{DetectorId, EventNumber};
use pixsim_messenger::{
    DepositedCharge, Message, MessageKind, PixelCharge, PropagatedCharge, Requirement,
};
use pixsim_module::{FinalizeContext, InitContext, Module, ModuleError, RunContext};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct Calls {
    runs: Vec<EventNumber>,
    finalized: Vec<u64>,
}

/// Shared view of what a [`MockModule`] was asked to do.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Arc<Mutex<Calls>>);

impl CallLog {
    /// Events in which `run` was called, in call order.
    pub fn runs(&self) -> Vec<EventNumber> {
        lock(&self.0).runs.clone()
    }

    /// Event counts passed to each `finalize` call.
    pub fn finalized(&self) -> Vec<u64> {
        lock(&self.0).finalized.clone()
    }
}

/// A scriptable module for engine tests.
///
/// In `run`, the module first fetches every subscribed kind (so a missing
/// required message fails the event), then dispatches one empty message
/// per published kind.
pub struct MockModule {
    name: String,
    detector: Option<DetectorId>,
    publishes: Vec<MessageKind>,
    subscribes: Vec<(MessageKind, Requirement)>,
    init_error: Option<ModuleError>,
    run_errors: Vec<(EventNumber, ModuleError)>,
    calls: CallLog,
}

impl MockModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detector: None,
            publishes: Vec::new(),
            subscribes: Vec::new(),
            init_error: None,
            run_errors: Vec::new(),
            calls: CallLog::default(),
        }
    }

    /// Bind to a detector.
    pub fn on(mut self, detector: impl Into<DetectorId>) -> Self {
        self.detector = Some(detector.into());
        self
    }

    pub fn publishes(mut self, kind: MessageKind) -> Self {
        self.publishes.push(kind);
        self
    }

    pub fn subscribes(mut self, kind: MessageKind, requirement: Requirement) -> Self {
        self.subscribes.push((kind, requirement));
        self
    }

    /// Fail `initialize` with `error`.
    pub fn failing_init(mut self, error: ModuleError) -> Self {
        self.init_error = Some(error);
        self
    }

    /// Fail `run` with `error` in `event`.
    pub fn failing_at(mut self, event: EventNumber, error: ModuleError) -> Self {
        self.run_errors.push((event, error));
        self
    }

    /// Handle to this module's call history.
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }
}

fn empty_message(kind: MessageKind, detector: Option<DetectorId>) -> Message {
    match kind {
        MessageKind::DepositedCharge => Message::new(detector, Vec::<DepositedCharge>::new()),
        MessageKind::PropagatedCharge => Message::new(detector, Vec::<PropagatedCharge>::new()),
        MessageKind::PixelCharge => Message::new(detector, Vec::<PixelCharge>::new()),
    }
}

impl Module for MockModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn detector(&self) -> Option<&DetectorId> {
        self.detector.as_ref()
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError> {
        if let Some(e) = self.init_error.clone() {
            log::debug!("Mock {} failing initialization: {e}", self.name);
            return Err(e);
        }
        for &(kind, requirement) in &self.subscribes {
            ctx.subscribe_own(kind, requirement)?;
        }
        for &kind in &self.publishes {
            ctx.publishes(kind)?;
        }
        Ok(())
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<(), ModuleError> {
        lock(&self.calls.0).runs.push(ctx.event());
        log::trace!("Mock {} running event {}", self.name, ctx.event());
        if let Some((_, e)) = self.run_errors.iter().find(|(ev, _)| *ev == ctx.event()) {
            log::debug!("Mock {} failing event {}: {e}", self.name, ctx.event());
            return Err(e.clone());
        }
        for &(kind, _) in &self.subscribes {
            match &self.detector {
                Some(_) => {
                    ctx.fetch(kind)?;
                }
                None => {
                    ctx.fetch_all(kind)?;
                }
            }
        }
        for &kind in &self.publishes {
            ctx.dispatch_message(empty_message(kind, self.detector.clone()))?;
        }
        Ok(())
    }

    fn finalize(&mut self, ctx: &mut FinalizeContext<'_>) -> Result<(), ModuleError> {
        lock(&self.calls.0).finalized.push(ctx.events());
        Ok(())
    }
}

/// Messages collected by a [`CaptureModule`].
#[derive(Clone, Debug, Default)]
pub struct Captured(Arc<Mutex<Vec<Arc<Message>>>>);

impl Captured {
    /// Every captured message, in arrival order.
    pub fn messages(&self) -> Vec<Arc<Message>> {
        lock(&self.0).clone()
    }

    /// Captured messages from `event`.
    pub fn in_event(&self, event: EventNumber) -> Vec<Arc<Message>> {
        lock(&self.0)
            .iter()
            .filter(|m| m.event() == event)
            .cloned()
            .collect()
    }
}

/// Optionally subscribes to one kind for every detector and keeps what
/// it receives.
pub struct CaptureModule {
    kind: MessageKind,
    captured: Captured,
}

impl CaptureModule {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            captured: Captured::default(),
        }
    }

    /// Handle to the captured messages.
    pub fn captured(&self) -> Captured {
        self.captured.clone()
    }
}

impl Module for CaptureModule {
    fn name(&self) -> &str {
        "Capture"
    }

    fn detector(&self) -> Option<&DetectorId> {
        None
    }

    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError> {
        ctx.subscribe_own(self.kind, Requirement::Optional)
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<(), ModuleError> {
        let found = ctx.fetch_all(self.kind)?;
        lock(&self.captured.0).extend(found);
        Ok(())
    }
}
