//! Sequential step runner.

use super::{BuildState, Step, StepAction};
use crate::errors::StepError;

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every step returned `Continue`.
    Completed,
    /// A step returned `Halt`; see `BuildState::error`.
    Halted,
    /// The cancel token fired before a step could start.
    Cancelled,
}

/// Runs steps in order and cleans up in reverse.
///
/// Every step whose `run` was invoked gets its `cleanup`, also after a halt or
/// cancellation, so a started VM is never leaked.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn run(&mut self, state: &mut BuildState) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::Completed;
        let mut attempted = 0;

        for step in self.steps.iter_mut() {
            if state.cancel.is_cancelled() {
                tracing::info!(step = step.name(), "Build cancelled before step");
                if state.error.is_none() {
                    state.error = Some(StepError::Cancelled);
                }
                outcome = PipelineOutcome::Cancelled;
                break;
            }

            tracing::debug!(step = step.name(), "Running step");
            attempted += 1;
            if step.run(state) == StepAction::Halt {
                tracing::info!(step = step.name(), "Step halted the build");
                outcome = if matches!(state.error, Some(StepError::Cancelled)) {
                    PipelineOutcome::Cancelled
                } else {
                    PipelineOutcome::Halted
                };
                break;
            }
        }

        for step in self.steps[..attempted].iter_mut().rev() {
            tracing::debug!(step = step.name(), "Cleaning up step");
            step.cleanup(state);
        }

        outcome
    }
}
