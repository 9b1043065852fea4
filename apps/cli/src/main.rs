mod commands;
mod config;
mod main_lib;

use clap::Parser;

use commands::Cli;
use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = Config::from_env()?;
    let state = build_state(&config).await?;

    let output = cli.command.run(&state).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
