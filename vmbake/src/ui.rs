//! User notification sink.

/// Fire-and-forget notifications shown to whoever runs the build.
///
/// - `say`: a status headline ("Starting VM ...")
/// - `message`: supporting detail or a warning
/// - `error`: a failure the user should see
pub trait Ui: Send + Sync {
    fn say(&self, message: &str);
    fn message(&self, message: &str);
    fn error(&self, message: &str);
}

/// Ui that forwards everything to `tracing` under the `ui` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUi;

impl Ui for TracingUi {
    fn say(&self, message: &str) {
        tracing::info!(target: "ui", "==> {}", message);
    }

    fn message(&self, message: &str) {
        tracing::info!(target: "ui", "    {}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "ui", "{}", message);
    }
}
