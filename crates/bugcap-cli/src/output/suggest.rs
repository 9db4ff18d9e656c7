// SPDX-License-Identifier: Apache-2.0

//! Rendering of pipeline runs.

use std::io::{self, Write};

use bugcap_core::{AiStats, PipelineResponse};
use console::style;

use super::{Renderable, cell_value, table};
use crate::cli::OutputContext;

impl Renderable for PipelineResponse {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        if let Some(error) = &self.error {
            writeln!(w, "{} {}", style("Failed:").red().bold(), error.message)?;
            return Ok(());
        }

        if let Some(analysis) = &self.analysis {
            writeln!(w, "{}", style(&analysis.ticket_title).bold())?;
            writeln!(w)?;
            writeln!(w, "{}", analysis.summary_markdown.trim_end())?;
            writeln!(w)?;
        }

        if self.stage2_fallback {
            writeln!(
                w,
                "{}",
                style("Field suggestion failed; showing the fallback issue.").yellow()
            )?;
            writeln!(w)?;
        }

        if let Some(suggestions) = &self.suggestions {
            let mut fields = table(&["Field", "Value", "Confidence", "Reasoning"]);
            for (key, value) in &suggestions.field_values {
                let confidence = suggestions
                    .confidence
                    .get(key)
                    .map_or_else(String::new, |c| format!("{:.0}%", c * 100.0));
                let reasoning = suggestions.reasoning.get(key).cloned().unwrap_or_default();
                fields.add_row(vec![key.clone(), cell_value(value), confidence, reasoning]);
            }
            writeln!(w, "{fields}")?;
        }

        if let Some(issue_type) = &self.selected_issue_type {
            writeln!(
                w,
                "{} {}",
                style("Issue type:").dim(),
                style(issue_type).cyan()
            )?;
        }
        if ctx.verbose {
            let stages = [("analyze", &self.stats.stage1), ("suggest", &self.stats.stage2)];
            for (stage, stats) in stages {
                if let Some(stats) = stats {
                    writeln!(
                        w,
                        "{} {}",
                        style(format!("{stage}:")).dim(),
                        stats_line(stats)
                    )?;
                }
            }
            writeln!(w, "{} {}", style("Run:").dim(), self.run_id)?;
        }
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        if let Some(error) = &self.error {
            writeln!(w, "**Failed:** {}", error.message)?;
            return Ok(());
        }

        if let Some(analysis) = &self.analysis {
            writeln!(w, "## {}", analysis.ticket_title)?;
            writeln!(w)?;
            writeln!(w, "{}", analysis.summary_markdown.trim_end())?;
            writeln!(w)?;
        }

        if self.stage2_fallback {
            writeln!(w, "> Field suggestion failed; fallback values below.")?;
            writeln!(w)?;
        }

        if let Some(suggestions) = &self.suggestions {
            writeln!(w, "### Suggested fields")?;
            writeln!(w)?;
            writeln!(w, "| Field | Value | Confidence |")?;
            writeln!(w, "|-------|-------|------------|")?;
            for (key, value) in &suggestions.field_values {
                let confidence = suggestions
                    .confidence
                    .get(key)
                    .map_or_else(String::new, |c| format!("{c:.2}"));
                let value = cell_value(value).replace('|', "\\|").replace('\n', " ");
                writeln!(w, "| `{key}` | {value} | {confidence} |")?;
            }
            writeln!(w)?;
        }

        if let Some(payload) = &self.jira_payload {
            writeln!(w, "### Payload")?;
            writeln!(w)?;
            writeln!(w, "```json")?;
            let body = serde_json::json!({ "fields": payload.fields });
            let json = serde_json::to_string_pretty(&body).map_err(io::Error::other)?;
            writeln!(w, "{json}")?;
            writeln!(w, "```")?;
        }
        Ok(())
    }
}

fn stats_line(stats: &AiStats) -> String {
    format!(
        "{} ({} in / {} out tokens, {}ms)",
        stats.model, stats.input_tokens, stats.output_tokens, stats.duration_ms
    )
}
