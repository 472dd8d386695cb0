use clap::Args;
use vmbake::args::GoTemplateRenderer;

use crate::cli::BuildArgs;
use crate::ui::ConsoleUi;

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Print a JSON array instead of one token per line
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: ShowArgs, _global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let config = args.build.load_config()?;
    let facts = args.build.facts();

    let tokens = vmbake::synthesize(
        &config,
        &args.build.boot_drive,
        &facts,
        &ConsoleUi,
        &GoTemplateRenderer,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }
    Ok(())
}
