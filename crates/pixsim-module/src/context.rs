//! Contexts handed to modules in each phase.
//!
//! [`InitContext`] gives mutable access to the bound detector so fields
//! can be installed; [`RunContext`] only shares it. Both scope messenger
//! calls to the calling module so a module cannot act on behalf of
//! another.

use std::sync::Arc;

use pixsim_core::{Configuration, DetectorId, EventNumber, ModuleId};
use pixsim_detector::Detector;
use pixsim_field::FieldCache;
use pixsim_messenger::{
    DetectorScope, Message, MessageKind, Messenger, Record, Requirement,
};

use crate::error::ModuleError;

/// Context for [`Module::initialize`](crate::Module::initialize).
pub struct InitContext<'a> {
    module: ModuleId,
    config: &'a Configuration,
    detector: Option<&'a mut Detector>,
    messenger: &'a mut Messenger,
    fields: &'a FieldCache,
}

impl<'a> InitContext<'a> {
    /// Construct an initialization context.
    ///
    /// Typically called by the engine, not by modules directly.
    pub fn new(
        module: ModuleId,
        config: &'a Configuration,
        detector: Option<&'a mut Detector>,
        messenger: &'a mut Messenger,
        fields: &'a FieldCache,
    ) -> Self {
        Self {
            module,
            config,
            detector,
            messenger,
            fields,
        }
    }

    /// ID of the module being initialized.
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// The module's configuration section.
    pub fn config(&self) -> &Configuration {
        self.config
    }

    /// The bound detector.
    pub fn detector(&self) -> Result<&Detector, ModuleError> {
        self.detector.as_deref().ok_or(ModuleError::MissingDetector)
    }

    /// The bound detector, for installing fields.
    pub fn detector_mut(&mut self) -> Result<&mut Detector, ModuleError> {
        self.detector.as_deref_mut().ok_or(ModuleError::MissingDetector)
    }

    /// Shared field tables for this simulation.
    pub fn field_cache(&self) -> &FieldCache {
        self.fields
    }

    /// Subscribe to `kind` within an explicit scope.
    pub fn subscribe(
        &mut self,
        kind: MessageKind,
        scope: DetectorScope,
        requirement: Requirement,
    ) -> Result<(), ModuleError> {
        self.messenger
            .subscribe(self.module, kind, scope, requirement)
            .map_err(ModuleError::from)
    }

    /// Subscribe to `kind` for the bound detector, or for any detector
    /// when the module is not bound to one.
    pub fn subscribe_own(
        &mut self,
        kind: MessageKind,
        requirement: Requirement,
    ) -> Result<(), ModuleError> {
        let scope = self.own_scope();
        self.subscribe(kind, scope, requirement)
    }

    /// Declare that this module dispatches `kind` for its own detector.
    pub fn publishes(&mut self, kind: MessageKind) -> Result<(), ModuleError> {
        let scope = self.own_scope();
        self.messenger
            .declare_publication(self.module, kind, scope)
            .map_err(ModuleError::from)
    }

    fn own_scope(&self) -> DetectorScope {
        match &self.detector {
            Some(d) => DetectorScope::Detector(d.id().clone()),
            None => DetectorScope::Any,
        }
    }
}

/// Context for [`Module::run`](crate::Module::run).
pub struct RunContext<'a> {
    module: ModuleId,
    event: EventNumber,
    detector: Option<&'a Detector>,
    messenger: &'a mut Messenger,
}

impl<'a> RunContext<'a> {
    /// Construct a run context.
    ///
    /// Typically called by the engine, not by modules directly.
    pub fn new(
        module: ModuleId,
        event: EventNumber,
        detector: Option<&'a Detector>,
        messenger: &'a mut Messenger,
    ) -> Self {
        Self {
            module,
            event,
            detector,
            messenger,
        }
    }

    /// ID of the running module.
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// The event being processed.
    pub fn event(&self) -> EventNumber {
        self.event
    }

    /// The bound detector.
    pub fn detector(&self) -> Result<&'a Detector, ModuleError> {
        self.detector.ok_or(ModuleError::MissingDetector)
    }

    /// The message of `kind` for the bound detector.
    pub fn fetch(&self, kind: MessageKind) -> Result<Option<Arc<Message>>, ModuleError> {
        let detector = self.detector()?.id();
        self.fetch_for(kind, detector)
    }

    /// The message of `kind` for `detector`.
    pub fn fetch_for(
        &self,
        kind: MessageKind,
        detector: &DetectorId,
    ) -> Result<Option<Arc<Message>>, ModuleError> {
        self.messenger
            .fetch(self.module, kind, detector)
            .map_err(ModuleError::from)
    }

    /// Every message of `kind` dispatched this event.
    pub fn fetch_all(&self, kind: MessageKind) -> Result<Vec<Arc<Message>>, ModuleError> {
        self.messenger
            .fetch_all(self.module, kind)
            .map(|found| found.into_vec())
            .map_err(ModuleError::from)
    }

    /// Dispatch `records` for the bound detector, or for no detector when
    /// the module is not bound to one.
    pub fn dispatch<R: Record>(&mut self, records: Vec<R>) -> Result<Arc<Message>, ModuleError> {
        let detector = self.detector.map(|d| d.id().clone());
        self.dispatch_message(Message::new(detector, records))
    }

    /// Dispatch a prepared message.
    pub fn dispatch_message(&mut self, message: Message) -> Result<Arc<Message>, ModuleError> {
        self.messenger
            .dispatch(self.module, message)
            .map_err(ModuleError::from)
    }
}

/// Context for [`Module::finalize`](crate::Module::finalize).
pub struct FinalizeContext<'a> {
    module: ModuleId,
    detector: Option<&'a Detector>,
    events: u64,
}

impl<'a> FinalizeContext<'a> {
    /// Construct a finalize context.
    pub fn new(module: ModuleId, detector: Option<&'a Detector>, events: u64) -> Self {
        Self {
            module,
            detector,
            events,
        }
    }

    /// ID of the module being finalized.
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// The bound detector.
    pub fn detector(&self) -> Result<&'a Detector, ModuleError> {
        self.detector.ok_or(ModuleError::MissingDetector)
    }

    /// Number of events that ran to completion.
    pub fn events(&self) -> u64 {
        self.events
    }
}
