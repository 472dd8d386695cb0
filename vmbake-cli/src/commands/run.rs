use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio_util::sync::CancellationToken;
use vmbake::{BuildState, Pipeline, PipelineOutcome, QemuDriver, RunStep, WaitStep};

use crate::cli::BuildArgs;
use crate::ui::ConsoleUi;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Message announced when the VM is launched
    #[arg(long, default_value = vmbake::constants::step::DEFAULT_MESSAGE)]
    pub message: String,

    /// QEMU binary, overrides `qemu_binary` from the config
    #[arg(long, env = "VMBAKE_QEMU_BINARY")]
    pub qemu_binary: Option<String>,

    /// Seconds to wait for QEMU to exit after SIGTERM before killing it
    #[arg(long, default_value_t = 10)]
    pub stop_timeout: u64,
}

pub async fn execute(args: RunArgs, _global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let config = args.build.load_config()?;
    let facts = args.build.facts();

    let binary = args
        .qemu_binary
        .clone()
        .unwrap_or_else(|| config.qemu_binary.clone());
    let driver = QemuDriver::locate(&binary)?
        .with_stop_timeout(Duration::from_secs(args.stop_timeout));
    tracing::info!(binary = %driver.binary().display(), "Using QEMU binary");

    let cancel = CancellationToken::new();
    let mut state = BuildState::new(config, facts, Arc::new(ConsoleUi), Box::new(driver))
        .with_cancel_token(cancel.clone());

    let mut pipeline = Pipeline::new()
        .with_step(RunStep::new(args.build.boot_drive.clone(), args.message.clone()))
        .with_step(WaitStep::new());

    // Ctrl-C cancels the build; the pipeline still tears the VM down
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling build");
            signal_token.cancel();
        }
    });

    let result = tokio::task::spawn_blocking(move || {
        let outcome = pipeline.run(&mut state);
        if outcome == PipelineOutcome::Completed {
            state.ui.say("VM exited, build step complete");
        }
        state.finish(outcome)
    })
    .await?;
    signal_task.abort();

    Ok(result?)
}
