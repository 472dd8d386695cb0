use std::thread;
use std::time::Duration;

use super::{BuildState, Step, StepAction};
use crate::errors::StepError;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Blocks until the VM process exits or the build is cancelled.
#[derive(Debug, Clone)]
pub struct WaitStep {
    poll_interval: Duration,
}

impl WaitStep {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for WaitStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for WaitStep {
    fn name(&self) -> &'static str {
        "wait"
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        state.ui.say("Waiting for the VM to shut down...");

        loop {
            if state.cancel.is_cancelled() {
                return state.halt_with(StepError::Cancelled);
            }
            if !state.driver.is_running() {
                state.ui.message("VM process exited");
                return StepAction::Continue;
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn cleanup(&mut self, _state: &mut BuildState) {}
}
