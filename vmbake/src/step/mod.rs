//! Build steps and the pipeline that sequences them.
//!
//! ```text
//! Pipeline::run
//!   ├─ RunStep::run      (synthesize args, start QEMU)
//!   ├─ WaitStep::run     (block until QEMU exits or cancel)
//!   ├─ WaitStep::cleanup
//!   └─ RunStep::cleanup  (stop QEMU, best effort)
//! ```
//!
//! Steps share a typed [`BuildState`] instead of a string-keyed bag.

mod pipeline;
mod run;
mod wait;

pub use pipeline::{Pipeline, PipelineOutcome};
pub use run::{RunPhase, RunStep};
pub use wait::WaitStep;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::args::{GoTemplateRenderer, TemplateRenderer};
use crate::config::QemuConfig;
use crate::driver::ProcessSupervisor;
use crate::errors::{StepError, VmbakeError, VmbakeResult};
use crate::facts::RuntimeFacts;
use crate::ui::Ui;

/// What the pipeline should do after a step ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Continue,
    /// Stop running further steps. The step records why in `BuildState::error`.
    Halt,
}

/// One unit of a build.
///
/// `cleanup` is called for every step whose `run` was invoked, in reverse
/// order, regardless of how the run ended.
pub trait Step: Send {
    fn name(&self) -> &'static str;

    fn run(&mut self, state: &mut BuildState) -> StepAction;

    fn cleanup(&mut self, state: &mut BuildState);
}

/// State shared by all steps of one build.
pub struct BuildState {
    pub config: QemuConfig,
    pub facts: RuntimeFacts,
    pub ui: Arc<dyn Ui>,
    pub driver: Box<dyn ProcessSupervisor>,
    pub renderer: Arc<dyn TemplateRenderer>,
    /// Cancelled by the caller to interrupt the build.
    pub cancel: CancellationToken,
    /// Set by the step that halted the pipeline.
    pub error: Option<StepError>,
}

impl BuildState {
    pub fn new(
        config: QemuConfig,
        facts: RuntimeFacts,
        ui: Arc<dyn Ui>,
        driver: Box<dyn ProcessSupervisor>,
    ) -> Self {
        Self {
            config,
            facts,
            ui,
            driver,
            renderer: Arc::new(GoTemplateRenderer),
            cancel: CancellationToken::new(),
            error: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Turn a pipeline outcome into a result, consuming the recorded error.
    pub fn finish(&mut self, outcome: PipelineOutcome) -> VmbakeResult<()> {
        match (outcome, self.error.take()) {
            (PipelineOutcome::Completed, _) => Ok(()),
            (_, Some(err)) => Err(VmbakeError::Step(err)),
            (_, None) => Err(VmbakeError::Incomplete),
        }
    }

    /// Record a halting error and show it to the user.
    pub(crate) fn halt_with(&mut self, err: StepError) -> StepAction {
        self.ui.error(&err.to_string());
        self.error = Some(err);
        StepAction::Halt
    }
}
