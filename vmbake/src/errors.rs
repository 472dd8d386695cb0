//! Error types for argument synthesis and the VM process lifecycle.
//!
//! Errors are categorized by where they stop the build:
//! - [`RenderError`] / [`ArgumentSynthesisError`]: bad `qemuargs` templates (fatal)
//! - [`LaunchError`]: the QEMU process could not be started (fatal)
//! - [`StopError`]: teardown failed (reported, never escalated)
//! - [`ConfigError`]: configuration could not be loaded or validated (user-fixable)

use std::io;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Top-Level Error
// ============================================================================

/// Crate-level error.
///
/// ```ignore
/// match err {
///     VmbakeError::Config(_) => { /* user should fix config */ }
///     VmbakeError::Step(StepError::Cancelled) => { /* interrupted */ }
///     VmbakeError::Step(_) => { /* build halted */ }
///     VmbakeError::Incomplete => {}
/// }
/// ```
#[derive(Debug, Error)]
pub enum VmbakeError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Step(#[from] StepError),

    /// Pipeline stopped early but no step recorded an error.
    #[error("build halted without reporting an error")]
    Incomplete,
}

pub type VmbakeResult<T> = Result<T, VmbakeError>;

// ============================================================================
// Synthesis Errors
// ============================================================================

/// A single template fragment failed to expand.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render {fragment:?}: {message}")]
pub struct RenderError {
    /// The raw fragment as written in the configuration.
    pub fragment: String,
    /// Renderer-provided reason (unknown field, malformed action, ...).
    pub message: String,
}

impl RenderError {
    pub fn new(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            message: message.into(),
        }
    }
}

/// Override arguments could not be turned into a command line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("while processing override arguments: {source}")]
pub struct ArgumentSynthesisError {
    #[from]
    pub source: RenderError,
}

// ============================================================================
// Process Errors
// ============================================================================

/// The process supervisor failed to start QEMU.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Binary could not be resolved.
    #[error("binary '{binary}' not found.\nSearched locations:\n{searched}")]
    BinaryNotFound { binary: String, searched: String },

    /// `spawn()` failed.
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A process is already owned by this supervisor.
    #[error("VM process already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    /// Output forwarding threads could not be created.
    #[error("log forwarding: {0}")]
    Logging(#[source] io::Error),
}

/// The process supervisor failed to stop QEMU.
#[derive(Debug, Error)]
pub enum StopError {
    #[error("signal pid {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("wait for pid {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Step Errors
// ============================================================================

/// Error recorded in the build state by the step that halted the pipeline.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Error processing QemuArgs: {0}")]
    Arguments(#[from] ArgumentSynthesisError),

    #[error("Error launching VM: {0}")]
    Launch(#[from] LaunchError),

    #[error("build cancelled")]
    Cancelled,
}

// ============================================================================
// Config Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{} problem(s) found:\n  * {}", .problems.len(), .problems.join("\n  * "))]
    Validation { problems: Vec<String> },
}
