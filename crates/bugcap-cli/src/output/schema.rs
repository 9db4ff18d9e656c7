// SPDX-License-Identifier: Apache-2.0

//! Rendering of project field schemas.

use std::io::{self, Write};

use bugcap_core::{Field, ProjectSchema};
use console::style;

use super::{Renderable, table};
use crate::cli::OutputContext;

impl Renderable for ProjectSchema {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(
            w,
            "{} {}",
            style(&self.project.key).bold(),
            style(&self.project.name).dim()
        )?;

        if self.issue_types.is_empty() {
            writeln!(w, "{}", style("No issue types available.").yellow())?;
            return Ok(());
        }

        for issue_type in &self.issue_types {
            writeln!(w)?;
            let suffix = if issue_type.is_subtask { " (sub-task)" } else { "" };
            writeln!(w, "{}{suffix}", style(&issue_type.name).cyan().bold())?;

            let mut fields = table(&["Field", "Name", "Type", "Required", "Allowed values"]);
            for field in issue_type.fields() {
                fields.add_row(vec![
                    field.id.clone(),
                    field.name.clone(),
                    value_type(field),
                    (if field.required { "yes" } else { "" }).to_string(),
                    allowed_values(field),
                ]);
            }
            writeln!(w, "{fields}")?;
        }
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(w, "## {} ({})", self.project.name, self.project.key)?;
        for issue_type in &self.issue_types {
            writeln!(w)?;
            writeln!(w, "### {}", issue_type.name)?;
            writeln!(w)?;
            writeln!(w, "| Field | Name | Type | Required |")?;
            writeln!(w, "|-------|------|------|----------|")?;
            for field in issue_type.fields() {
                writeln!(
                    w,
                    "| `{}` | {} | {} | {} |",
                    field.id,
                    field.name,
                    value_type(field),
                    if field.required { "yes" } else { "no" }
                )?;
            }
        }
        Ok(())
    }
}

fn value_type(field: &Field) -> String {
    match &field.items {
        Some(items) => format!("{}<{items}>", field.value_type),
        None => field.value_type.clone(),
    }
}

fn allowed_values(field: &Field) -> String {
    const SHOWN: usize = 6;
    let Some(values) = &field.allowed_values else {
        return String::new();
    };
    let mut names: Vec<String> = values.iter().take(SHOWN).map(super::cell_value).collect();
    if values.len() > SHOWN {
        names.push(format!("+{} more", values.len() - SHOWN));
    }
    names.join(", ")
}
