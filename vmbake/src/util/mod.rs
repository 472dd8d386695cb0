use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::constants::envs;
use crate::errors::LaunchError;

/// Find a binary by name.
///
/// Search order:
/// 1. `$VMBAKE_QEMU_PATH` (a full path to the binary)
/// 2. each `$PATH` entry joined with `binary_name`
///
/// A `binary_name` containing a path separator is used as-is if it exists.
pub fn find_binary(binary_name: &str) -> Result<PathBuf, LaunchError> {
    let direct = Path::new(binary_name);
    if direct.components().count() > 1 && direct.exists() {
        return Ok(direct.to_path_buf());
    }

    let mut candidates = Vec::new();

    if let Ok(explicit) = std::env::var(envs::VMBAKE_QEMU_PATH) {
        candidates.push(PathBuf::from(explicit));
    }

    if let Some(path) = std::env::var_os("PATH") {
        candidates.extend(std::env::split_paths(&path).map(|dir| dir.join(binary_name)));
    }

    for candidate in &candidates {
        tracing::trace!("Finding binary {:?} in path: {:?}", binary_name, candidate);
        if candidate.is_file() {
            tracing::debug!(binary = %candidate.display(), "Found binary");
            return Ok(candidate.clone());
        }
    }

    let searched = candidates
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(LaunchError::BinaryNotFound {
        binary: binary_name.to_string(),
        searched,
    })
}

/// Install a global subscriber writing to stderr and, if given, a file writer.
///
/// Safe to call more than once; later calls are ignored.
pub fn register_to_tracing(file_writer: Option<NonBlocking>, env_filter: EnvFilter) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}
