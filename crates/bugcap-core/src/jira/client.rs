// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the Jira Cloud REST API (v3).

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use super::IssueTracker;
use super::types::{CreateMetaResponse, Field, ProjectResponse};
use crate::auth::JiraCredentials;
use crate::error::BugcapError;

const SERVICE: &str = "Jira";

/// Authenticated Jira client.
///
/// Construct once per host and share; the inner `reqwest::Client` pools
/// connections.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    email: String,
    api_token: SecretString,
}

impl JiraClient {
    /// Creates a client from resolved credentials.
    ///
    /// # Errors
    ///
    /// Returns `BugcapError::Network` if the HTTP client cannot be built.
    pub fn new(credentials: JiraCredentials, timeout_seconds: u64) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            email: credentials.email,
            api_token: credentials.api_token,
        })
    }

    /// Site URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> crate::Result<Response> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.email, Some(self.api_token.expose_secret()))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| BugcapError::upstream(SERVICE, e.to_string()))?;
        Ok(response)
    }
}

/// Turns a non-2xx response into an upstream error carrying the body.
async fn error_from_response(response: Response, what: &str) -> BugcapError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let hint = match status {
        StatusCode::UNAUTHORIZED => " (check JIRA_EMAIL and JIRA_API_TOKEN)",
        StatusCode::FORBIDDEN => " (no permission)",
        _ => "",
    };
    BugcapError::Upstream {
        service: SERVICE.to_string(),
        message: format!("{what} returned HTTP {}{hint}: {body}", status.as_u16()),
        status: Some(status.as_u16()),
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[instrument(skip(self))]
    async fn get_project(&self, project_key: &str) -> crate::Result<ProjectResponse> {
        let url = format!(
            "{}/rest/api/3/project/{}",
            self.base_url,
            utf8_percent_encode(project_key, NON_ALPHANUMERIC)
        );
        let response = self.get(&url, &[]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BugcapError::NotFound {
                resource: "Project".to_string(),
                message: format!("no project with key '{project_key}' is visible"),
            });
        }
        if !response.status().is_success() {
            return Err(error_from_response(response, "Project lookup").await);
        }

        let project: ProjectResponse = response
            .json()
            .await
            .map_err(|e| BugcapError::upstream(SERVICE, format!("invalid project JSON: {e}")))?;
        debug!(issue_types = project.issue_types.len(), "Fetched project");
        Ok(project)
    }

    #[instrument(skip(self))]
    async fn get_create_fields(
        &self,
        project_key: &str,
        issue_type_name: &str,
    ) -> crate::Result<Vec<Field>> {
        let url = format!("{}/rest/api/3/issue/createmeta", self.base_url);
        let response = self
            .get(
                &url,
                &[
                    ("projectKeys", project_key),
                    ("issuetypeNames", issue_type_name),
                    ("expand", "projects.issuetypes.fields"),
                ],
            )
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "Create metadata lookup").await);
        }

        let meta: CreateMetaResponse = response
            .json()
            .await
            .map_err(|e| BugcapError::upstream(SERVICE, format!("invalid createmeta JSON: {e}")))?;
        Ok(meta.into_fields())
    }
}
