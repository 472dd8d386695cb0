//! Log streaming from QEMU stdout/stderr to the parent's tracing system.

use std::{
    io::{self, BufRead, BufReader},
    process::{ChildStderr, ChildStdout},
    thread::{self, JoinHandle},
};

#[derive(Debug, Clone, Copy)]
enum LogLevel {
    Debug,
    Warn,
}

/// Owns the reader threads for one QEMU process.
///
/// Each stream gets a dedicated thread that logs line by line until the pipe
/// closes, which happens when the process exits.
pub(super) struct LogStreamHandler {
    stdout_thread: Option<JoinHandle<()>>,
    stderr_thread: Option<JoinHandle<()>>,
}

impl LogStreamHandler {
    pub(super) fn new(stdout: ChildStdout, stderr: ChildStderr) -> io::Result<Self> {
        // stdout is chatter (monitor banners), stderr carries QEMU's real complaints
        let stdout_thread =
            Self::spawn_reader_thread(BufReader::new(stdout), "stdout", LogLevel::Debug)?;
        let stderr_thread =
            Self::spawn_reader_thread(BufReader::new(stderr), "stderr", LogLevel::Warn)?;

        Ok(Self {
            stdout_thread: Some(stdout_thread),
            stderr_thread: Some(stderr_thread),
        })
    }

    fn spawn_reader_thread<R: BufRead + Send + 'static>(
        reader: R,
        stream_name: &str,
        log_level: LogLevel,
    ) -> io::Result<JoinHandle<()>> {
        let stream_name_owned = stream_name.to_string();

        thread::Builder::new()
            .name(format!("qemu-{}", stream_name))
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => match log_level {
                            LogLevel::Debug => tracing::debug!(target: "qemu:stdout", "{}", line),
                            LogLevel::Warn => tracing::warn!(target: "qemu:stderr", "{}", line),
                        },
                        Err(e) => {
                            tracing::debug!(stream = %stream_name_owned, error = %e, "QEMU output stream closed");
                            break;
                        }
                    }
                }
            })
    }

    /// Wait for both reader threads. Call after the process has been reaped.
    pub(super) fn join(&mut self) {
        for handle in [self.stdout_thread.take(), self.stderr_thread.take()]
            .into_iter()
            .flatten()
        {
            if handle.join().is_err() {
                tracing::warn!("QEMU log reader thread panicked");
            }
        }
    }
}

impl Drop for LogStreamHandler {
    fn drop(&mut self) {
        self.join();
    }
}
