// SPDX-License-Identifier: Apache-2.0

//! Jira integration: read-only metadata lookups and the field schema fetcher.

pub mod client;
pub mod schema;
pub mod types;

use async_trait::async_trait;

pub use client::JiraClient;
pub use schema::fetch_project_schema;
pub use types::{Field, IssueTypeSchema, ProjectInfo, ProjectSchema, ProjectResponse};

/// Read access to an issue tracker's project metadata.
///
/// [`JiraClient`] talks to the REST API; tests substitute in-memory fakes.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Looks up a project and its issue types by key.
    async fn get_project(&self, project_key: &str) -> crate::Result<ProjectResponse>;

    /// Lists the create-screen fields for one issue type of a project.
    async fn get_create_fields(
        &self,
        project_key: &str,
        issue_type_name: &str,
    ) -> crate::Result<Vec<Field>>;
}
