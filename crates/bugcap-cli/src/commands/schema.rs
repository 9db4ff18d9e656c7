// SPDX-License-Identifier: Apache-2.0

//! `bugcap schema`: show a project's create-screen fields.

use anyhow::Result;
use bugcap_core::{AppConfig, EnvCredentialProvider, ProjectSchema, fetch_schema};
use tracing::debug;

/// Fetches the field schema of `project`.
pub async fn run(project: &str, config: &AppConfig) -> Result<ProjectSchema> {
    let credentials = EnvCredentialProvider::new(&config.jira);
    let schema = fetch_schema(&credentials, config, project.trim()).await?;
    debug!(
        project = %schema.project.key,
        issue_types = schema.issue_types.len(),
        "Fetched field schema"
    );
    Ok(schema)
}
