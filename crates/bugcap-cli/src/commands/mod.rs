// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the bugcap CLI.

pub mod completion;
pub mod schema;
pub mod suggest;

use std::time::Duration;

use anyhow::{Result, bail};
use bugcap_core::AppConfig;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{Commands, CompletionCommand, OutputContext, OutputFormat};
use crate::output;

/// Creates a styled spinner (only if interactive).
fn maybe_spinner(ctx: &OutputContext, message: &str) -> Option<ProgressBar> {
    if ctx.is_interactive() {
        let s = ProgressBar::new_spinner();
        if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            s.set_style(spinner);
        }
        s.set_message(message.to_string());
        s.enable_steady_tick(Duration::from_millis(100));
        Some(s)
    } else {
        None
    }
}

/// Dispatch to the appropriate command handler.
pub async fn run(command: Commands, ctx: OutputContext, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Suggest(args) => {
            let response = suggest::run(args, &ctx, config).await?;
            // Structured formats always get the envelope, failed or not.
            if response.success || !matches!(ctx.format, OutputFormat::Text) {
                output::render(&response, &ctx)?;
            }
            if let Some(error) = response.error {
                bail!("{}", error.message);
            }
            Ok(())
        }

        Commands::Schema { project } => {
            let spinner = maybe_spinner(&ctx, &format!("Fetching field schema for {project}..."));
            let result = schema::run(&project, config).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            output::render(&result?, &ctx)
        }

        Commands::Completion(CompletionCommand::Generate { shell }) => {
            completion::run_generate(shell)
        }
    }
}
