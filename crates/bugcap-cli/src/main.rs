// SPDX-License-Identifier: Apache-2.0

//! bugcap - turn captured console logs into AI-suggested Jira issues.
//!
//! Reads logs from a file or stdin, runs the suggestion pipeline and prints
//! the resulting create-issue payload.

mod cli;
mod commands;
mod errors;
mod logging;
mod output;

use anyhow::{Context, Result};
use bugcap_core::{config, get_provider};
use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, OutputContext};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let output_ctx = OutputContext::from_cli(cli.output, cli.quiet, cli.verbose);

    let mut config = config::load_config().context("Failed to load configuration")?;
    debug!("Configuration loaded successfully");

    // Command-line overrides apply to both stages
    if let Some(provider) = &cli.provider {
        get_provider(provider).ok_or_else(|| anyhow::anyhow!("Unknown AI provider: {provider}"))?;
        config.ai.provider.clone_from(provider);
        config.ai.tasks = None;
        debug!("Overriding AI provider to: {provider}");
    }

    if let Some(model) = &cli.model {
        config.ai.model.clone_from(model);
        config.ai.tasks = None;
        debug!("Overriding AI model to: {model}");
    }

    match commands::run(cli.command, output_ctx, &config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let formatted = errors::format_error(&e);
            eprintln!("Error: {formatted}");
            std::process::exit(1);
        }
    }
}
