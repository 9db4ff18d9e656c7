// SPDX-License-Identifier: Apache-2.0

//! Host-facing facade: credential resolution and client construction.
//!
//! Hosts (CLI, HTTP server) implement or reuse a `CredentialProvider`, build
//! [`PipelineClients`] once, and run pipelines against them. Nothing here
//! reads secrets on its own.

use tracing::{debug, instrument};

use crate::ai::AiClient;
use crate::auth::CredentialProvider;
use crate::config::{AiConfig, AppConfig, JiraConfig, TaskType};
use crate::error::BugcapError;
use crate::jira::{JiraClient, ProjectSchema, fetch_project_schema};
use crate::pipeline::{PipelineRequest, PipelineResponse, SuggestionPipeline};

/// Builds an authenticated Jira client.
///
/// # Errors
///
/// Returns `MissingCredentials` if site URL, email or token is unavailable.
pub fn build_jira_client(
    credentials: &dyn CredentialProvider,
    config: &JiraConfig,
) -> crate::Result<JiraClient> {
    let jira = credentials.jira_credentials().ok_or_else(|| {
        BugcapError::MissingCredentials {
            service: "Jira".to_string(),
            env_var: credentials
                .missing_jira_env()
                .unwrap_or(crate::auth::JIRA_API_TOKEN_ENV)
                .to_string(),
        }
    })?;
    JiraClient::new(jira, config.api_timeout_seconds)
}

/// Builds the AI client for one pipeline stage, honoring per-stage overrides.
///
/// # Errors
///
/// Returns `Config` for an unknown provider or `MissingCredentials` when its
/// API key is unavailable.
pub fn build_ai_client(
    credentials: &dyn CredentialProvider,
    config: &AiConfig,
    task: TaskType,
) -> crate::Result<AiClient> {
    let (provider, model) = config.resolve_for_task(task);
    debug!(?task, %provider, %model, "Resolved AI provider");
    AiClient::new(&provider, &model, credentials, config)
}

/// Clients needed to run the pipeline, constructed once per host.
#[derive(Debug)]
pub struct PipelineClients {
    /// Tracker client.
    pub tracker: JiraClient,
    /// Stage 1 client.
    pub analyzer: AiClient,
    /// Stage 2 client.
    pub suggester: AiClient,
}

impl PipelineClients {
    /// Builds every client from configuration and credentials.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or credential error encountered.
    pub fn from_config(
        credentials: &dyn CredentialProvider,
        config: &AppConfig,
    ) -> crate::Result<Self> {
        Ok(Self {
            tracker: build_jira_client(credentials, &config.jira)?,
            analyzer: build_ai_client(credentials, &config.ai, TaskType::Analyze)?,
            suggester: build_ai_client(credentials, &config.ai, TaskType::Suggest)?,
        })
    }

    /// Borrows the clients as a pipeline.
    #[must_use]
    pub fn pipeline(&self, config: &AppConfig) -> SuggestionPipeline<'_> {
        SuggestionPipeline::with_stage_providers(
            &self.tracker,
            &self.analyzer,
            &self.suggester,
            config.pipeline.clone(),
        )
    }
}

/// Runs one pipeline with freshly built clients.
///
/// Configuration errors are reported in the response like any other
/// failure.
#[instrument(skip_all, fields(project = %request.project_key))]
pub async fn suggest_issue(
    credentials: &dyn CredentialProvider,
    config: &AppConfig,
    request: &PipelineRequest,
) -> PipelineResponse {
    match PipelineClients::from_config(credentials, config) {
        Ok(clients) => clients.pipeline(config).run(request).await,
        Err(e) => PipelineResponse::from_error(&e),
    }
}

/// Fetches the field schema of a project.
///
/// # Errors
///
/// Returns an error if Jira credentials are missing or the lookup fails.
#[instrument(skip(credentials, config))]
pub async fn fetch_schema(
    credentials: &dyn CredentialProvider,
    config: &AppConfig,
    project_key: &str,
) -> crate::Result<ProjectSchema> {
    let client = build_jira_client(credentials, &config.jira)?;
    fetch_project_schema(&client, project_key).await
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::auth::JiraCredentials;
    use crate::error::ErrorKind;

    struct StaticCredentials {
        jira: bool,
        ai: bool,
    }

    impl CredentialProvider for StaticCredentials {
        fn jira_credentials(&self) -> Option<JiraCredentials> {
            self.jira.then(|| JiraCredentials {
                base_url: "https://acme.atlassian.net".to_string(),
                email: "qa@acme.test".to_string(),
                api_token: SecretString::from("token"),
            })
        }

        fn ai_api_key(&self, _env_var: &str) -> Option<SecretString> {
            self.ai.then(|| SecretString::from("sk-test"))
        }
    }

    #[test]
    fn test_clients_build_with_all_credentials() {
        let config = AppConfig::default();
        let clients =
            PipelineClients::from_config(&StaticCredentials { jira: true, ai: true }, &config)
                .unwrap();
        assert_eq!(clients.tracker.base_url(), "https://acme.atlassian.net");
    }

    #[test]
    fn test_missing_jira_credentials() {
        let config = AppConfig::default();
        let err = build_jira_client(
            &StaticCredentials {
                jira: false,
                ai: true,
            },
            &config.jira,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_missing_ai_key_reports_configuration_error() {
        let config = AppConfig::default();
        let request = PipelineRequest::builder()
            .logs("TypeError")
            .project_key("PMT")
            .build();

        let response = suggest_issue(
            &StaticCredentials {
                jira: true,
                ai: false,
            },
            &config,
            &request,
        )
        .await;

        assert!(!response.success);
        assert_eq!(response.error_kind(), Some(ErrorKind::Configuration));
        assert!(
            response
                .error
                .unwrap()
                .message
                .contains("OPENAI_API_KEY")
        );
    }
}
