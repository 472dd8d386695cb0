//! Shared fixtures for vmbake tests: a recording UI, a scriptable process
//! supervisor, and sample config/facts.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use vmbake::errors::{LaunchError, StopError};
use vmbake::{ProcessSupervisor, QemuConfig, RuntimeFacts, Ui};

// ============================================================================
// RECORDING UI
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Say(String),
    Message(String),
    Error(String),
}

/// Ui that remembers everything it was told.
#[derive(Debug, Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().clone()
    }

    pub fn says(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Say(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Message(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.collect(|e| match e {
            UiEvent::Error(m) => Some(m.clone()),
            _ => None,
        })
    }

    fn collect(&self, f: impl Fn(&UiEvent) -> Option<String>) -> Vec<String> {
        self.events.lock().iter().filter_map(f).collect()
    }
}

impl Ui for RecordingUi {
    fn say(&self, message: &str) {
        self.events.lock().push(UiEvent::Say(message.to_string()));
    }

    fn message(&self, message: &str) {
        self.events.lock().push(UiEvent::Message(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.events.lock().push(UiEvent::Error(message.to_string()));
    }
}

// ============================================================================
// FAKE SUPERVISOR
// ============================================================================

/// Observable state of a [`FakeSupervisor`], shared with the test.
#[derive(Debug, Default)]
pub struct SupervisorRecord {
    /// Argument lists passed to every `start` call.
    pub starts: Vec<Vec<String>>,
    pub stop_calls: usize,
    pub running: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    /// Process "exits" after this many `is_running` polls.
    pub exit_after_polls: Option<usize>,
    pub polls: usize,
}

/// In-memory [`ProcessSupervisor`] driven by a shared [`SupervisorRecord`].
#[derive(Debug, Clone, Default)]
pub struct FakeSupervisor {
    record: Arc<Mutex<SupervisorRecord>>,
}

impl FakeSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_start() -> Self {
        let fake = Self::new();
        fake.record.lock().fail_start = true;
        fake
    }

    pub fn failing_stop() -> Self {
        let fake = Self::new();
        fake.record.lock().fail_stop = true;
        fake
    }

    pub fn exiting_after(polls: usize) -> Self {
        let fake = Self::new();
        fake.record.lock().exit_after_polls = Some(polls);
        fake
    }

    /// Handle for assertions after the supervisor moved into the build state.
    pub fn record(&self) -> Arc<Mutex<SupervisorRecord>> {
        Arc::clone(&self.record)
    }

    pub fn boxed(&self) -> Box<dyn ProcessSupervisor> {
        Box::new(self.clone())
    }
}

impl ProcessSupervisor for FakeSupervisor {
    fn start(&mut self, args: &[String]) -> Result<(), LaunchError> {
        let mut record = self.record.lock();
        record.starts.push(args.to_vec());
        if record.fail_start {
            return Err(LaunchError::Spawn {
                binary: PathBuf::from("/fake/qemu"),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            });
        }
        record.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), StopError> {
        let mut record = self.record.lock();
        record.stop_calls += 1;
        if record.fail_stop {
            return Err(StopError::Signal {
                pid: 4242,
                source: io::Error::new(io::ErrorKind::PermissionDenied, "operation not permitted"),
            });
        }
        record.running = false;
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        let mut record = self.record.lock();
        record.polls += 1;
        if let Some(limit) = record.exit_after_polls
            && record.polls > limit
        {
            record.running = false;
        }
        record.running
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn sample_config() -> QemuConfig {
    QemuConfig {
        vm_name: "debian-12".into(),
        output_directory: PathBuf::from("/builds/output-debian"),
        http_directory: "http".into(),
        ..Default::default()
    }
}

pub fn sample_facts() -> RuntimeFacts {
    RuntimeFacts {
        iso_path: PathBuf::from("/cache/debian-12.iso"),
        vnc_port: 5932,
        ssh_host_port: 3456,
        http_port: 8765,
        floppy_path: None,
    }
}

/// Build a `qemuargs` row from string slices.
pub fn row(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Write a JSON config into `dir` and return its path.
pub fn write_config(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("vmbake.json");
    std::fs::write(&path, json).expect("Failed to write test config");
    path
}

/// Temporary directory that lives as long as the returned guard.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("Failed to create temp dir")
}
