// SPDX-License-Identifier: Apache-2.0

//! Credential health check.

use bugcap_core::{AppConfig, CredentialProvider, TaskType, get_provider};
use serde::Serialize;

/// Whether a credential is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CredentialStatus {
    /// Present.
    Valid,
    /// Not configured.
    Missing,
}

impl From<bool> for CredentialStatus {
    fn from(present: bool) -> Self {
        if present { Self::Valid } else { Self::Missing }
    }
}

/// `GET /health` response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthCheckResponse {
    /// Jira site, email and token.
    pub jira: CredentialStatus,
    /// API key of every provider a stage is configured to use.
    pub ai: CredentialStatus,
}

impl HealthCheckResponse {
    /// Checks credential presence without calling any upstream service.
    pub fn check(credentials: &dyn CredentialProvider, config: &AppConfig) -> Self {
        let jira = credentials.jira_credentials().is_some();
        let ai = [TaskType::Analyze, TaskType::Suggest].iter().all(|task| {
            let (provider, _) = config.ai.resolve_for_task(*task);
            get_provider(&provider)
                .and_then(|p| credentials.ai_api_key(p.api_key_env))
                .is_some()
        });
        Self {
            jira: jira.into(),
            ai: ai.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bugcap_core::JiraCredentials;
    use bugcap_core::config::{TaskOverride, TasksConfig};
    use secrecy::SecretString;

    use super::*;

    struct OnlyKey(&'static str);

    impl CredentialProvider for OnlyKey {
        fn jira_credentials(&self) -> Option<JiraCredentials> {
            None
        }

        fn ai_api_key(&self, env_var: &str) -> Option<SecretString> {
            (env_var == self.0).then(|| SecretString::from("sk-test"))
        }
    }

    #[test]
    fn test_default_provider_key_present() {
        let health = HealthCheckResponse::check(&OnlyKey("OPENAI_API_KEY"), &AppConfig::default());
        assert_eq!(health.jira, CredentialStatus::Missing);
        assert_eq!(health.ai, CredentialStatus::Valid);
    }

    #[test]
    fn test_stage_override_needs_its_own_key() {
        let mut config = AppConfig::default();
        config.ai.tasks = Some(TasksConfig {
            analyze: None,
            suggest: Some(TaskOverride {
                provider: Some("groq".to_string()),
                model: None,
            }),
        });
        let health = HealthCheckResponse::check(&OnlyKey("OPENAI_API_KEY"), &config);
        assert_eq!(health.ai, CredentialStatus::Missing);
    }
}
