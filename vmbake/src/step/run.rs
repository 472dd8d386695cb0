//! Launch/teardown step for the QEMU process.

use super::{BuildState, Step, StepAction};
use crate::args;
use crate::constants::step as const_step;
use crate::errors::{ArgumentSynthesisError, StepError};

/// Lifecycle of the launched VM as seen by [`RunStep`].
///
/// ```text
/// Idle ──run──→ Running ──cleanup──→ Stopped
///   └────────────cleanup─────────────↗
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Stopped,
}

/// Starts QEMU with the synthesized command line and stops it on cleanup.
#[derive(Debug, Clone)]
pub struct RunStep {
    boot_drive: String,
    message: String,
    phase: RunPhase,
}

impl RunStep {
    /// `boot_drive` goes to `-boot` verbatim; `message` is announced on launch.
    pub fn new(boot_drive: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            boot_drive: boot_drive.into(),
            message: message.into(),
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Synthesize the QEMU command line for the current state.
    pub fn command_args(&self, state: &BuildState) -> Result<Vec<String>, ArgumentSynthesisError> {
        args::synthesize(
            &state.config,
            &self.boot_drive,
            &state.facts,
            state.ui.as_ref(),
            state.renderer.as_ref(),
        )
    }
}

impl Default for RunStep {
    fn default() -> Self {
        Self::new(const_step::DEFAULT_BOOT_DRIVE, const_step::DEFAULT_MESSAGE)
    }
}

impl Step for RunStep {
    fn name(&self) -> &'static str {
        "run"
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        state.ui.say(&self.message);

        let command = match self.command_args(state) {
            Ok(command) => command,
            Err(e) => return state.halt_with(StepError::Arguments(e)),
        };

        if let Err(e) = state.driver.start(&command) {
            return state.halt_with(StepError::Launch(e));
        }

        self.phase = RunPhase::Running;
        StepAction::Continue
    }

    fn cleanup(&mut self, state: &mut BuildState) {
        if let Err(e) = state.driver.stop() {
            tracing::warn!(error = %e, "VM shutdown failed during cleanup");
            state.ui.error(&format!("Error shutting down VM: {}", e));
        }
        self.phase = RunPhase::Stopped;
    }
}
