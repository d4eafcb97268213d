//! AbuSim Agent Binary
//!
//! Loads the agent configuration, connects to the coordinator and runs the
//! agent until the process is terminated.

use abusim_agent::agent;
use abusim_agent::cli::Cli;
use abusim_agent::logging::init_logging;
use anyhow::Context;
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = cli
        .runtime_config()
        .context("Failed to load runtime settings")?;

    // The configuration must parse before any connection is attempted.
    let config = cli.agent_configuration()?;
    init_logging(&runtime.logging, Some(&config.name)).context("Failed to initialize logging")?;

    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    rt.block_on(agent::run(config, runtime.coordinator.address.as_str()))
        .context("Agent terminated")?;
    Ok(())
}
