// SPDX-License-Identifier: Apache-2.0

//! Output rendering for CLI commands.
//!
//! Supports text, JSON, YAML and markdown. Command handlers return data;
//! this module handles presentation.

use std::io::{self, Write};

use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use crate::cli::{OutputContext, OutputFormat};

mod schema;
mod suggest;

/// Trait for types that can be rendered in multiple output formats.
pub trait Renderable: Serialize {
    /// Render as human-readable text to the given writer.
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()>;

    /// Render as markdown. Defaults to text rendering.
    fn render_markdown(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        self.render_text(w, ctx)
    }
}

/// Generic render function - handles JSON/YAML via serde, delegates text/markdown to trait.
pub fn render<T: Renderable>(result: &T, ctx: &OutputContext) -> Result<()> {
    render_to(result, ctx, &mut io::stdout())
}

fn render_to<T: Renderable>(result: &T, ctx: &OutputContext, w: &mut dyn Write) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(result).context("Failed to serialize to JSON")?;
            writeln!(w, "{json}")?;
        }
        OutputFormat::Yaml => {
            let yaml = serde_saphyr::to_string(result).context("Failed to serialize to YAML")?;
            writeln!(w, "{yaml}")?;
        }
        OutputFormat::Markdown => {
            result
                .render_markdown(w, ctx)
                .context("Failed to render markdown")?;
        }
        OutputFormat::Text => {
            result
                .render_text(w, ctx)
                .context("Failed to render text")?;
        }
    }
    Ok(())
}

/// Table with the house style; wraps to the terminal width when there is one.
fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().copied());
    table
}

/// Renders a JSON value compactly for a table cell.
fn cell_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(o) => o
            .get("name")
            .or_else(|| o.get("value"))
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| value.to_string(), str::to_string),
        serde_json::Value::Array(items) => items
            .iter()
            .map(cell_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
