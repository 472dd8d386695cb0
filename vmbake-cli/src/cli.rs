use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use vmbake::constants::step as const_step;
use vmbake::{QemuConfig, RuntimeFacts};

/// Launch QEMU for an image build with synthesized arguments
#[derive(Parser, Debug)]
#[command(name = "vmbake", author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the QEMU command line without launching anything
    Args(crate::commands::args::ShowArgs),

    /// Launch QEMU and wait until it exits or Ctrl-C is pressed
    Run(crate::commands::run::RunArgs),
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Also write logs to a daily rotating file in this directory
    #[arg(long, global = true, env = "VMBAKE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl GlobalFlags {
    /// Install the tracing subscriber.
    ///
    /// Returns the file writer guard, which must stay alive until exit.
    pub fn init_logging(&self) -> anyhow::Result<Option<WorkerGuard>> {
        let default_level = if self.debug { "debug" } else { "warn" };
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_level))
            .context("invalid log filter")?;

        let (writer, guard) = match &self.log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create log directory {}", dir.display()))?;
                let appender = tracing_appender::rolling::daily(dir, "vmbake.log");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };

        vmbake::util::register_to_tracing(writer, env_filter);
        Ok(guard)
    }
}

/// Config file and the runtime facts normally discovered by earlier steps.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Path to the JSON build config
    #[arg(short, long)]
    pub config: PathBuf,

    /// Install ISO attached as -cdrom
    #[arg(long, default_value = "install.iso")]
    pub iso_path: PathBuf,

    /// Host VNC port (display = port - 5900)
    #[arg(long, default_value_t = 5900)]
    pub vnc_port: u16,

    /// Host port forwarded to guest SSH
    #[arg(long, default_value_t = 2222)]
    pub ssh_host_port: u16,

    /// Port of the build HTTP server
    #[arg(long, default_value_t = 8000)]
    pub http_port: u16,

    /// Floppy image attached as -fda
    #[arg(long)]
    pub floppy_path: Option<PathBuf>,

    /// Value for -boot
    #[arg(long, default_value = const_step::DEFAULT_BOOT_DRIVE)]
    pub boot_drive: String,
}

impl BuildArgs {
    pub fn load_config(&self) -> anyhow::Result<QemuConfig> {
        QemuConfig::load(&self.config)
            .with_context(|| format!("failed to load config {}", self.config.display()))
    }

    pub fn facts(&self) -> RuntimeFacts {
        RuntimeFacts {
            iso_path: self.iso_path.clone(),
            vnc_port: self.vnc_port,
            ssh_host_port: self.ssh_host_port,
            http_port: self.http_port,
            floppy_path: self.floppy_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_args_defaults() {
        let cli = Cli::parse_from(["vmbake", "args", "--config", "build.json"]);
        let Commands::Args(show) = cli.command else {
            panic!("expected args subcommand");
        };
        let facts = show.build.facts();
        assert_eq!(facts.vnc_port, 5900);
        assert_eq!(facts.ssh_host_port, 2222);
        assert!(facts.floppy_path.is_none());
        assert_eq!(show.build.boot_drive, "once=d");
    }
}
