//! The [`Module`] trait.

use pixsim_core::DetectorId;

use crate::context::{FinalizeContext, InitContext, RunContext};
use crate::error::ModuleError;

/// One computation stage of the simulation pipeline.
///
/// # Contract
///
/// - `initialize()` and `finalize()` run exactly once per instance;
///   `run()` runs once per event, after every module it depends on.
/// - Subscriptions and publications are declared in `initialize()`; the
///   engine derives the execution order from them.
/// - Configuration is read in `initialize()`. A module never learns about
///   other modules except through the messages it fetches.
///
/// # Object safety
///
/// This trait is object-safe; the engine stores modules as
/// `Vec<Box<dyn Module>>`.
///
/// # Examples
///
/// A module that publishes an empty deposit batch every event:
///
/// ```
/// use pixsim_core::DetectorId;
/// use pixsim_messenger::{DepositedCharge, MessageKind};
/// use pixsim_module::{InitContext, Module, ModuleError, RunContext};
///
/// struct Quiet {
///     detector: DetectorId,
/// }
///
/// impl Module for Quiet {
///     fn name(&self) -> &str { "Quiet" }
///
///     fn detector(&self) -> Option<&DetectorId> { Some(&self.detector) }
///
///     fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError> {
///         ctx.publishes(MessageKind::DepositedCharge)
///     }
///
///     fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<(), ModuleError> {
///         ctx.dispatch(Vec::<DepositedCharge>::new())?;
///         Ok(())
///     }
/// }
///
/// let module = Quiet { detector: DetectorId::new("dut") };
/// assert_eq!(module.name(), "Quiet");
/// ```
pub trait Module: Send + 'static {
    /// Module type name, used for configuration sections and reporting.
    fn name(&self) -> &str;

    /// Detector this instance is bound to, or `None` for a module that
    /// covers the whole setup.
    fn detector(&self) -> Option<&DetectorId>;

    /// Read configuration, install fields and declare messages.
    fn initialize(&mut self, ctx: &mut InitContext<'_>) -> Result<(), ModuleError>;

    /// Process one event.
    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<(), ModuleError>;

    /// Called once after the last event.
    fn finalize(&mut self, _ctx: &mut FinalizeContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }
}
