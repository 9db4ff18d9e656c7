// SPDX-License-Identifier: Apache-2.0

//! `bugcap suggest`: run the suggestion pipeline over captured logs.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use bugcap_core::{
    AppConfig, CaptureTime, EnvCredentialProvider, LogContext, PipelineClients, PipelineEvent,
    PipelineRequest, PipelineResponse,
};
use chrono::Utc;
use tracing::debug;

use super::maybe_spinner;
use crate::cli::{OutputContext, SuggestArgs};

/// Reads logs from `path`, or from stdin when `path` is absent or `-`.
fn read_logs(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read logs from {}", p.display())),
        _ => {
            let mut logs = String::new();
            std::io::stdin()
                .read_to_string(&mut logs)
                .context("Failed to read logs from stdin")?;
            Ok(logs)
        }
    }
}

/// Builds the capture context from `--context` and `--source`.
fn build_context(path: Option<&Path>, source: Option<String>) -> Result<LogContext> {
    let mut context = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read context from {}", p.display()))?;
            serde_json::from_str::<LogContext>(&raw)
                .with_context(|| format!("Invalid context JSON in {}", p.display()))?
        }
        None => LogContext::default(),
    };
    if source.is_some() {
        context.source = source;
    }
    context
        .timestamp
        .get_or_insert_with(|| CaptureTime::from(Utc::now()));
    Ok(context)
}

fn progress_message(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::SchemaFetched { selected, .. } => {
            format!("Analyzing logs for a {selected}...")
        }
        PipelineEvent::LogsAnalyzed { title } => format!("Suggesting fields for \"{title}\"..."),
        PipelineEvent::FieldsSuggested { .. } => "Assembling payload...".to_string(),
        PipelineEvent::PayloadAssembled => "Done".to_string(),
    }
}

/// Runs the pipeline for the given arguments.
///
/// Input and configuration problems are returned as errors; pipeline
/// failures are reported inside the response.
pub async fn run(
    args: SuggestArgs,
    ctx: &OutputContext,
    config: &AppConfig,
) -> Result<PipelineResponse> {
    let logs = read_logs(args.logs.as_deref())?;
    let context = build_context(args.context.as_deref(), args.source)?;
    debug!(chars = logs.chars().count(), "Read captured logs");

    let credentials = EnvCredentialProvider::new(&config.jira);
    let clients = PipelineClients::from_config(&credentials, config)?;

    let request = PipelineRequest::builder()
        .logs(logs)
        .project_key(args.project)
        .context(context)
        .maybe_issue_type_override(args.issue_type)
        .build();

    let spinner = maybe_spinner(ctx, "Fetching field schema...");
    let response = clients
        .pipeline(config)
        .run_with_events(&request, |event| {
            if let Some(s) = &spinner {
                s.set_message(progress_message(event));
            }
        })
        .await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_context_file_and_source_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"source": "extension", "timestamp": "2026-03-01T10:00:00Z", "media": [{{"kind": "video", "durationSeconds": 12.5}}], "tabUrl": "https://shop.test/cart"}}"#
        )
        .unwrap();

        let context =
            build_context(Some(file.path()), Some("browser-console".to_string())).unwrap();
        assert_eq!(context.source.as_deref(), Some("browser-console"));
        assert_eq!(
            context.timestamp.and_then(|t| t.to_datetime()).unwrap().to_rfc3339(),
            "2026-03-01T10:00:00+00:00"
        );
        assert_eq!(context.media.len(), 1);
        assert_eq!(context.extra["tabUrl"], "https://shop.test/cart");
    }

    #[test]
    fn test_context_accepts_epoch_timestamp() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"timestamp": 1714564800000, "media": [{{"kind": "gif"}}]}}"#
        )
        .unwrap();

        let context = build_context(Some(file.path()), None).unwrap();
        assert_eq!(
            context.timestamp.and_then(|t| t.to_datetime()).unwrap().to_rfc3339(),
            "2024-05-01T12:00:00+00:00"
        );
        assert_eq!(context.media[0].kind, bugcap_core::MediaKind::Other);
    }

    #[test]
    fn test_context_defaults_timestamp() {
        let context = build_context(None, None).unwrap();
        assert!(context.timestamp.is_some());
        assert!(context.source.is_none());
    }

    #[test]
    fn test_invalid_context_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = build_context(Some(file.path()), None).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid context JSON"));
    }

    #[test]
    fn test_read_logs_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Uncaught TypeError").unwrap();
        let logs = read_logs(Some(file.path())).unwrap();
        assert_eq!(logs.trim(), "Uncaught TypeError");
    }

    #[test]
    fn test_progress_messages() {
        let msg = progress_message(&PipelineEvent::LogsAnalyzed {
            title: "Checkout crashes".to_string(),
        });
        assert_eq!(msg, "Suggesting fields for \"Checkout crashes\"...");
    }
}
