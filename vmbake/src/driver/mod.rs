//! Process supervision for the launched VM.

mod log_stream;
mod qemu;

pub use qemu::QemuDriver;

use crate::errors::{LaunchError, StopError};

/// Starts and stops the VM process.
///
/// One supervisor owns at most one process at a time. `stop` must be safe
/// to call when nothing was started, since cleanup runs after failed launches
/// too.
pub trait ProcessSupervisor: Send {
    /// Start the VM with the given argument tokens.
    ///
    /// Returns once the process has been spawned.
    fn start(&mut self, args: &[String]) -> Result<(), LaunchError>;

    /// Stop the VM and reap it. Blocks until the process is gone.
    fn stop(&mut self) -> Result<(), StopError>;

    /// Whether the owned process is still alive.
    fn is_running(&mut self) -> bool;
}
