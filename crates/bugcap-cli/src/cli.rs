// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for bugcap.
//!
//! Uses clap's derive API for declarative CLI parsing.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Extended help text for the generate subcommand with shell-specific examples.
const COMPLETION_GENERATE_HELP: &str = r#"EXAMPLES

  bash
    Add to ~/.bashrc or ~/.bash_profile:
      eval "$(bugcap completion generate bash)"

  zsh
    Generate completion file:
      mkdir -p ~/.zsh/completions
      bugcap completion generate zsh > ~/.zsh/completions/_bugcap

    Add to ~/.zshrc (before compinit):
      fpath=(~/.zsh/completions $fpath)
      autoload -U compinit && compinit -i

  fish
    Generate completion file:
      bugcap completion generate fish > ~/.config/fish/completions/bugcap.fish
"#;

/// Extended help text for the suggest subcommand.
const SUGGEST_HELP: &str = r"EXAMPLES

  Read logs from a file:
    bugcap suggest --project PMT --logs console.log

  Pipe logs from another tool and print the payload as JSON:
    pbpaste | bugcap suggest --project PMT -o json

  Force an issue type and attach capture metadata:
    bugcap suggest --project PMT --logs console.log --issue-type Task --context session.json
";

/// Output format for CLI results.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colors (default)
    #[default]
    Text,
    /// JSON output for programmatic consumption
    Json,
    /// YAML output for programmatic consumption
    Yaml,
    /// Markdown output for pasting into an issue
    Markdown,
}

/// Global output configuration passed to commands.
#[derive(Clone)]
pub struct OutputContext {
    /// Output format (text, json, yaml, markdown)
    pub format: OutputFormat,
    /// Suppress non-essential output (spinners, progress)
    pub quiet: bool,
    /// Enable verbose output
    pub verbose: bool,
    /// Whether stdout is a terminal (TTY)
    pub is_tty: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(format: OutputFormat, quiet: bool, verbose: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
            is_tty: std::io::stdout().is_terminal(),
        }
    }

    /// Returns true if interactive elements (spinners, colors) should be shown.
    pub fn is_interactive(&self) -> bool {
        self.is_tty && !self.quiet && matches!(self.format, OutputFormat::Text)
    }
}

/// bugcap - turn captured console logs into AI-suggested Jira issues.
///
/// Fetches the project's field schema, asks a model to analyze the logs and
/// fill in the fields, and prints a ready-to-submit create-issue payload.
#[derive(Parser)]
#[command(name = "bugcap")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Output format (text, json, yaml, markdown)
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Suppress non-essential output (spinners, progress)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug-level logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Override configured AI provider for both stages (e.g., openai, groq)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Override configured AI model for both stages (e.g., gpt-4o-mini)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Suggest a Jira issue from captured console logs
    #[command(after_long_help = SUGGEST_HELP)]
    Suggest(SuggestArgs),

    /// Show the create-screen field schema of a project
    Schema {
        /// Jira project key (e.g., PMT)
        #[arg(long, short = 'p')]
        project: String,
    },

    /// Generate shell completion scripts
    #[command(subcommand)]
    Completion(CompletionCommand),
}

/// Arguments of `bugcap suggest`.
#[derive(clap::Args)]
pub struct SuggestArgs {
    /// Jira project key (e.g., PMT)
    #[arg(long, short = 'p')]
    pub project: String,

    /// File containing the captured logs ("-" or omitted reads stdin)
    #[arg(long, short = 'l', value_name = "FILE")]
    pub logs: Option<PathBuf>,

    /// Issue type to use instead of the configured default
    #[arg(long, short = 't')]
    pub issue_type: Option<String>,

    /// Where the logs were captured (e.g., browser-console)
    #[arg(long)]
    pub source: Option<String>,

    /// JSON file with capture metadata (timestamp, source, media)
    #[arg(long, value_name = "FILE")]
    pub context: Option<PathBuf>,
}

/// Completion subcommands
#[derive(Subcommand)]
pub enum CompletionCommand {
    /// Generate completion script to stdout
    #[command(after_long_help = COMPLETION_GENERATE_HELP)]
    Generate {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_suggest_args_parse() {
        let cli = Cli::parse_from([
            "bugcap",
            "suggest",
            "--project",
            "PMT",
            "--logs",
            "console.log",
            "--issue-type",
            "Task",
            "-o",
            "json",
        ]);
        assert!(matches!(cli.output, OutputFormat::Json));
        match cli.command {
            Commands::Suggest(args) => {
                assert_eq!(args.project, "PMT");
                assert_eq!(args.logs, Some(PathBuf::from("console.log")));
                assert_eq!(args.issue_type.as_deref(), Some("Task"));
                assert!(args.context.is_none());
            }
            _ => panic!("expected suggest"),
        }
    }

    #[test]
    fn test_non_text_output_is_not_interactive() {
        let ctx = OutputContext {
            format: OutputFormat::Json,
            quiet: false,
            verbose: false,
            is_tty: true,
        };
        assert!(!ctx.is_interactive());
    }
}
