// SPDX-License-Identifier: Apache-2.0

//! Credential resolution for the tracker and the completion service.
//!
//! Hosts implement [`CredentialProvider`] (or use [`EnvCredentialProvider`])
//! so the library never reads secrets from hidden globals.

use secrecy::SecretString;
use tracing::debug;

use crate::config::JiraConfig;

/// Environment variable holding the Jira site URL.
pub const JIRA_BASE_URL_ENV: &str = "JIRA_BASE_URL";

/// Environment variable holding the Jira account email.
pub const JIRA_EMAIL_ENV: &str = "JIRA_EMAIL";

/// Environment variable holding the Jira API token.
pub const JIRA_API_TOKEN_ENV: &str = "JIRA_API_TOKEN";

/// Everything needed for HTTP Basic auth against Jira.
#[derive(Debug, Clone)]
pub struct JiraCredentials {
    /// Site URL without trailing slash.
    pub base_url: String,
    /// Account email.
    pub email: String,
    /// API token.
    pub api_token: SecretString,
}

/// Provides tracker and AI credentials for API calls.
///
/// Implementations return `None` when a credential is unavailable; the
/// caller turns that into a configuration error naming the variable to set.
pub trait CredentialProvider: Send + Sync {
    /// Retrieves Jira site, email and token.
    fn jira_credentials(&self) -> Option<JiraCredentials>;

    /// Retrieves the API key stored in `env_var` for an AI provider.
    fn ai_api_key(&self, env_var: &str) -> Option<SecretString>;

    /// Name of a Jira setting that still has to be supplied, for error messages.
    fn missing_jira_env(&self) -> Option<&'static str> {
        self.jira_credentials()
            .is_none()
            .then_some(JIRA_API_TOKEN_ENV)
    }
}

/// Resolves credentials from environment variables, falling back to the
/// config file for the non-secret Jira settings.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider {
    base_url: Option<String>,
    email: Option<String>,
}

impl EnvCredentialProvider {
    /// Creates a provider that falls back to `config` for site URL and email.
    #[must_use]
    pub fn new(config: &JiraConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            email: config.email.clone(),
        }
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn jira_credentials(&self) -> Option<JiraCredentials> {
        let base_url = non_empty_env(JIRA_BASE_URL_ENV).or_else(|| self.base_url.clone())?;
        let email = non_empty_env(JIRA_EMAIL_ENV).or_else(|| self.email.clone())?;
        let Some(token) = non_empty_env(JIRA_API_TOKEN_ENV) else {
            debug!("No Jira API token found in environment");
            return None;
        };

        debug!("Resolved Jira credentials");
        Some(JiraCredentials {
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            api_token: SecretString::from(token),
        })
    }

    fn missing_jira_env(&self) -> Option<&'static str> {
        if non_empty_env(JIRA_BASE_URL_ENV).is_none() && self.base_url.is_none() {
            Some(JIRA_BASE_URL_ENV)
        } else if non_empty_env(JIRA_EMAIL_ENV).is_none() && self.email.is_none() {
            Some(JIRA_EMAIL_ENV)
        } else if non_empty_env(JIRA_API_TOKEN_ENV).is_none() {
            Some(JIRA_API_TOKEN_ENV)
        } else {
            None
        }
    }

    fn ai_api_key(&self, env_var: &str) -> Option<SecretString> {
        if let Some(key) = non_empty_env(env_var) {
            debug!(env_var, "Resolved AI API key from environment variable");
            Some(SecretString::from(key))
        } else {
            debug!(env_var, "No AI API key found in environment");
            None
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let saved: Vec<_> = vars
            .iter()
            .map(|(k, _)| (k.to_string(), std::env::var(k).ok()))
            .collect();
        unsafe {
            for (k, v) in vars {
                match v {
                    Some(v) => std::env::set_var(k, v),
                    None => std::env::remove_var(k),
                }
            }
        }
        f();
        unsafe {
            for (k, v) in saved {
                match v {
                    Some(v) => std::env::set_var(&k, v),
                    None => std::env::remove_var(&k),
                }
            }
        }
    }

    #[test]
    #[serial]
    fn test_jira_credentials_from_env() {
        with_env(
            &[
                (JIRA_BASE_URL_ENV, Some("https://acme.atlassian.net/")),
                (JIRA_EMAIL_ENV, Some("qa@acme.test")),
                (JIRA_API_TOKEN_ENV, Some("token")),
            ],
            || {
                let provider = EnvCredentialProvider::default();
                let creds = provider.jira_credentials().expect("credentials");
                assert_eq!(creds.base_url, "https://acme.atlassian.net");
                assert_eq!(creds.email, "qa@acme.test");
                assert!(provider.missing_jira_env().is_none());
            },
        );
    }

    #[test]
    #[serial]
    fn test_jira_credentials_fall_back_to_config() {
        with_env(
            &[
                (JIRA_BASE_URL_ENV, None),
                (JIRA_EMAIL_ENV, None),
                (JIRA_API_TOKEN_ENV, Some("token")),
            ],
            || {
                let config = JiraConfig {
                    base_url: Some("https://cfg.atlassian.net".to_string()),
                    email: Some("cfg@acme.test".to_string()),
                    ..JiraConfig::default()
                };
                let creds = EnvCredentialProvider::new(&config)
                    .jira_credentials()
                    .expect("credentials");
                assert_eq!(creds.base_url, "https://cfg.atlassian.net");
                assert_eq!(creds.email, "cfg@acme.test");
            },
        );
    }

    #[test]
    #[serial]
    fn test_missing_token_reported() {
        with_env(
            &[
                (JIRA_BASE_URL_ENV, Some("https://acme.atlassian.net")),
                (JIRA_EMAIL_ENV, Some("qa@acme.test")),
                (JIRA_API_TOKEN_ENV, None),
            ],
            || {
                let provider = EnvCredentialProvider::default();
                assert!(provider.jira_credentials().is_none());
                assert_eq!(provider.missing_jira_env(), Some(JIRA_API_TOKEN_ENV));
            },
        );
    }

    #[test]
    #[serial]
    fn test_blank_ai_key_is_missing() {
        with_env(&[("BUGCAP_TEST_AI_KEY", Some("  "))], || {
            let provider = EnvCredentialProvider::default();
            assert!(provider.ai_api_key("BUGCAP_TEST_AI_KEY").is_none());
        });
    }
}
