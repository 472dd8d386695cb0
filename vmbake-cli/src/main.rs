mod cli;
mod commands;
mod ui;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = cli.global.init_logging()?;

    match cli.command {
        Commands::Args(args) => commands::args::execute(args, &cli.global),
        Commands::Run(args) => commands::run::execute(args, &cli.global).await,
    }
}
