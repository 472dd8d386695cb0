//! QemuDriver - spawns and stops the QEMU process.

use std::{
    io,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use super::ProcessSupervisor;
use super::log_stream::LogStreamHandler;
use crate::errors::{LaunchError, StopError};
use crate::util::find_binary;

const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Supervisor for a local QEMU binary.
///
/// Keeps the `Child` handle so `stop` can reap the process. QEMU output is
/// forwarded to tracing while it runs.
pub struct QemuDriver {
    binary: PathBuf,
    stop_timeout: Duration,
    process: Option<Child>,
    logs: Option<LogStreamHandler>,
}

impl QemuDriver {
    /// Create a driver for an explicit binary path.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            process: None,
            logs: None,
        }
    }

    /// Resolve `binary_name` (e.g. "qemu-system-x86_64") and create a driver.
    pub fn locate(binary_name: &str) -> Result<Self, LaunchError> {
        Ok(Self::new(find_binary(binary_name)?))
    }

    /// How long `stop` waits after SIGTERM before killing.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// PID of the owned process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(Child::id)
    }

    /// Ask the process to shut down and wait up to the stop timeout.
    ///
    /// Returns true if it exited on its own.
    #[cfg(unix)]
    fn terminate_gracefully(child: &mut Child, timeout: Duration) -> Result<bool, StopError> {
        let pid = child.id();

        // SAFETY: plain kill(2) on a pid we own and have not reaped yet.
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            // ESRCH: exited between try_wait and kill
            if err.raw_os_error() != Some(libc::ESRCH) {
                return Err(StopError::Signal { pid, source: err });
            }
        }

        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(pid, %status, "QEMU exited after SIGTERM");
                    return Ok(true);
                }
                Ok(None) => thread::sleep(STOP_POLL_INTERVAL),
                Err(source) => return Err(StopError::Wait { pid, source }),
            }
        }
        Ok(false)
    }

    /// No graceful signal off unix, go straight to kill.
    #[cfg(not(unix))]
    fn terminate_gracefully(_child: &mut Child, _timeout: Duration) -> Result<bool, StopError> {
        Ok(false)
    }
}

impl ProcessSupervisor for QemuDriver {
    fn start(&mut self, args: &[String]) -> Result<(), LaunchError> {
        if self.is_running()
            && let Some(pid) = self.pid()
        {
            return Err(LaunchError::AlreadyRunning { pid });
        }
        if self.process.is_some() {
            // Previous run exited on its own: reap it and join its log threads
            if let Err(e) = self.stop() {
                tracing::warn!(error = %e, "Failed to reap previous QEMU process");
            }
        }

        tracing::info!(binary = %self.binary.display(), "Starting QEMU");
        tracing::debug!(args = ?args, "QEMU arguments");

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                tracing::error!(binary = %self.binary.display(), error = %source, "Failed to spawn QEMU");
                LaunchError::Spawn {
                    binary: self.binary.clone(),
                    source,
                }
            })?;

        let pid = child.id();
        match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => match LogStreamHandler::new(stdout, stderr) {
                Ok(logs) => self.logs = Some(logs),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(LaunchError::Logging(e));
                }
            },
            _ => tracing::warn!(pid, "QEMU stdio not piped, output will not be logged"),
        }

        tracing::info!(pid, "QEMU process started");
        self.process = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), StopError> {
        let Some(mut child) = self.process.take() else {
            tracing::debug!("No QEMU process to stop");
            return Ok(());
        };
        let pid = child.id();

        let result = match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(pid, %status, "QEMU already exited");
                Ok(())
            }
            Ok(None) => match Self::terminate_gracefully(&mut child, self.stop_timeout) {
                Ok(true) => Ok(()),
                Ok(false) => {
                    tracing::warn!(
                        pid,
                        timeout_ms = self.stop_timeout.as_millis(),
                        "QEMU did not exit in time, killing"
                    );
                    let _ = child.kill();
                    child
                        .wait()
                        .map(|_| ())
                        .map_err(|source| StopError::Wait { pid, source })
                }
                Err(e) => {
                    // Still reap it so we never leak the child
                    let _ = child.kill();
                    let _ = child.wait();
                    Err(e)
                }
            },
            Err(source) => Err(StopError::Wait { pid, source }),
        };

        if let Some(mut logs) = self.logs.take() {
            logs.join();
        }

        if result.is_ok() {
            tracing::info!(pid, "QEMU process stopped");
        }
        result
    }

    fn is_running(&mut self) -> bool {
        match self.process.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(_))) | None => false,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Failed to query QEMU process state");
                false
            }
        }
    }
}

impl Drop for QemuDriver {
    fn drop(&mut self) {
        if self.process.is_some()
            && let Err(e) = self.stop()
        {
            tracing::warn!("Failed to stop QEMU on drop: {}", e);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh_driver() -> QemuDriver {
        QemuDriver::new("/bin/sh").with_stop_timeout(Duration::from_secs(5))
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut driver = sh_driver();
        assert!(!driver.is_running());
        driver.stop().unwrap();
    }

    #[test]
    fn test_start_then_stop() {
        let mut driver = sh_driver();
        driver.start(&args(&["-c", "sleep 30"])).unwrap();
        assert!(driver.is_running());
        assert!(driver.pid().is_some());

        driver.stop().unwrap();
        assert!(!driver.is_running());
        assert!(driver.pid().is_none());
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut driver = sh_driver();
        driver.start(&args(&["-c", "sleep 30"])).unwrap();
        let err = driver.start(&args(&["-c", "sleep 30"])).unwrap_err();
        assert!(matches!(err, LaunchError::AlreadyRunning { .. }));
        driver.stop().unwrap();
    }

    #[test]
    fn test_stop_after_exit() {
        let mut driver = sh_driver();
        driver.start(&args(&["-c", "exit 0"])).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while driver.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        driver.stop().unwrap();
    }

    #[test]
    fn test_restart_after_exit_reaps_previous_child() {
        let mut driver = sh_driver();
        driver.start(&args(&["-c", "exit 0"])).unwrap();
        let first = driver.pid().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while driver.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }

        driver.start(&args(&["-c", "sleep 30"])).unwrap();
        let second = driver.pid().unwrap();
        assert_ne!(first, second);
        assert!(driver.is_running());

        // First child already reaped: ECHILD.
        // SAFETY: WNOHANG with a null status pointer.
        let rc = unsafe { libc::waitpid(first as libc::pid_t, std::ptr::null_mut(), libc::WNOHANG) };
        assert_eq!(rc, -1);

        driver.stop().unwrap();
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let mut driver = QemuDriver::new("/nonexistent/qemu-system-x86_64");
        let err = driver.start(&[]).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }
}
