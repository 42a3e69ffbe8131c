use anyhow::{Context, Result};
use clap::Parser;

use gator::cli::Cli;
use gator::commands::{self, AppState};
use gator::logging;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    // Usage errors exit with code 2 here, before any state is touched
    let cli = Cli::parse();

    let mut state = AppState::load(cli.config.as_deref())
        .await
        .context("Failed to load config and open database")?;

    let name = cli.command.name();
    let output = commands::execute(&mut state, cli.command)
        .await
        .with_context(|| format!("gator {} failed", name))?;

    for line in output {
        println!("{}", line);
    }
    Ok(())
}
