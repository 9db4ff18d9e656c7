// SPDX-License-Identifier: Apache-2.0

//! Configuration management for bugcap.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `BUGCAP_`)
//! 2. Config file: `~/.config/bugcap/config.toml`
//! 3. Built-in defaults
//!
//! Secrets never live in the config file: the Jira API token and the AI
//! provider key are read from the environment (see [`crate::auth`]).
//!
//! # Examples
//!
//! ```bash
//! # Override AI model via environment variable
//! BUGCAP_AI__MODEL=gpt-4o cargo run
//! ```

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::BugcapError;

/// Pipeline stage, used to pick per-stage model overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    /// Stage 1: log analysis.
    Analyze,
    /// Stage 2: field value suggestion.
    Suggest,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// AI provider settings.
    pub ai: AiConfig,
    /// Jira settings.
    pub jira: JiraConfig,
    /// Pipeline limits and defaults.
    pub pipeline: PipelineConfig,
    /// HTTP host settings.
    pub server: ServerConfig,
}

/// Stage-specific AI model override.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TaskOverride {
    /// Optional provider override for this stage.
    pub provider: Option<String>,
    /// Optional model override for this stage.
    pub model: Option<String>,
}

/// Stage-specific AI configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TasksConfig {
    /// Stage 1 override.
    pub analyze: Option<TaskOverride>,
    /// Stage 2 override.
    pub suggest: Option<TaskOverride>,
}

/// AI provider settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// AI provider name from the registry (e.g., "openai", "openrouter").
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Default maximum tokens for API responses.
    pub max_tokens: u32,
    /// Temperature for API requests (0.0-1.0).
    pub temperature: f32,
    /// Circuit breaker failure threshold before opening.
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds.
    pub circuit_breaker_reset_seconds: u64,
    /// Stage-specific model overrides.
    pub tasks: Option<TasksConfig>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 30,
            max_tokens: 2000,
            temperature: 0.3,
            circuit_breaker_threshold: 3,
            circuit_breaker_reset_seconds: 60,
            tasks: None,
        }
    }
}

impl AiConfig {
    /// Resolve provider and model for a pipeline stage.
    ///
    /// Checks stage-specific overrides first, then falls back to the
    /// default provider and model.
    #[must_use]
    pub fn resolve_for_task(&self, task: TaskType) -> (String, String) {
        let task_override = match task {
            TaskType::Analyze => self.tasks.as_ref().and_then(|t| t.analyze.as_ref()),
            TaskType::Suggest => self.tasks.as_ref().and_then(|t| t.suggest.as_ref()),
        };

        let provider = task_override
            .and_then(|o| o.provider.clone())
            .unwrap_or_else(|| self.provider.clone());

        let model = task_override
            .and_then(|o| o.model.clone())
            .unwrap_or_else(|| self.model.clone());

        (provider, model)
    }
}

/// Jira settings.
///
/// `base_url` and `email` may also come from `JIRA_BASE_URL` / `JIRA_EMAIL`;
/// the API token only comes from `JIRA_API_TOKEN`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Site URL, e.g. `https://example.atlassian.net`.
    pub base_url: Option<String>,
    /// Account email used for Basic auth.
    pub email: Option<String>,
    /// API request timeout in seconds.
    pub api_timeout_seconds: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            api_timeout_seconds: 10,
        }
    }
}

/// Pipeline limits and defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Logs longer than this (in characters) are truncated before prompting.
    pub max_log_chars: usize,
    /// Completion budget for Stage 1.
    pub analyze_max_tokens: u32,
    /// Completion budget for Stage 2.
    pub suggest_max_tokens: u32,
    /// Deadline applied to each stage.
    pub stage_timeout_seconds: u64,
    /// Issue type chosen when the caller gives no override.
    pub default_issue_type: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_log_chars: 12_000,
            analyze_max_tokens: 1000,
            suggest_max_tokens: 2000,
            stage_timeout_seconds: 30,
            default_issue_type: "Bug".to_string(),
        }
    }
}

/// HTTP host settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Returns the bugcap configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/bugcap`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("bugcap");
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".config")
        .join("bugcap")
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration.
///
/// Loads from config file (if exists) and environment variables.
/// Environment variables use the prefix `BUGCAP_` and double underscore
/// for nested keys (e.g., `BUGCAP_PIPELINE__MAX_LOG_CHARS`).
///
/// # Errors
///
/// Returns `BugcapError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, BugcapError> {
    let config_path = config_file_path();

    let config = Config::builder()
        // Load from config file (optional - may not exist)
        .add_source(File::with_name(config_path.to_string_lossy().as_ref()).required(false))
        // Override with environment variables
        .add_source(
            Environment::with_prefix("BUGCAP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn parse(config_str: &str) -> AppConfig {
        Config::builder()
            .add_source(config::File::from_str(config_str, config::FileFormat::Toml))
            .build()
            .expect("should build config")
            .try_deserialize()
            .expect("should deserialize")
    }

    #[test]
    #[serial]
    fn test_load_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", dir.path());
        }

        let config = load_config().expect("should load with defaults");

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert_eq!(config.ai.provider, "openai");
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.ai.timeout_seconds, 30);
        assert!((config.ai.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.jira.api_timeout_seconds, 10);
        assert_eq!(config.pipeline.stage_timeout_seconds, 30);
        assert_eq!(config.pipeline.default_issue_type, "Bug");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    #[serial]
    fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("bugcap");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(
            app_dir.join("config.toml"),
            "[jira]\nbase_url = \"https://acme.atlassian.net\"\nemail = \"qa@acme.test\"\n",
        )
        .unwrap();

        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", dir.path());
        }

        let config = load_config().expect("should load file");

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert_eq!(
            config.jira.base_url.as_deref(),
            Some("https://acme.atlassian.net")
        );
        assert_eq!(config.jira.email.as_deref(), Some("qa@acme.test"));
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_pipeline_section_overrides() {
        let app_config = parse(
            r#"
[pipeline]
max_log_chars = 4000
stage_timeout_seconds = 5
default_issue_type = "Task"
"#,
        );

        assert_eq!(app_config.pipeline.max_log_chars, 4000);
        assert_eq!(app_config.pipeline.stage_timeout_seconds, 5);
        assert_eq!(app_config.pipeline.default_issue_type, "Task");
        // Untouched keys keep their defaults
        assert_eq!(app_config.pipeline.analyze_max_tokens, 1000);
    }

    #[test]
    fn test_resolve_for_task_no_overrides() {
        let ai_config = AiConfig::default();

        let (provider, model) = ai_config.resolve_for_task(TaskType::Analyze);
        assert_eq!(provider, "openai");
        assert_eq!(model, "gpt-4o-mini");

        let (provider, model) = ai_config.resolve_for_task(TaskType::Suggest);
        assert_eq!(provider, "openai");
        assert_eq!(model, "gpt-4o-mini");
    }

    #[test]
    fn test_resolve_for_task_with_partial_overrides() {
        let app_config = parse(
            r#"
[ai]
provider = "openai"
model = "gpt-4o-mini"

[ai.tasks.suggest]
provider = "openrouter"
model = "anthropic/claude-haiku-4.5"

[ai.tasks.analyze]
model = "gpt-4o"
"#,
        );

        let (provider, model) = app_config.ai.resolve_for_task(TaskType::Analyze);
        assert_eq!(provider, "openai");
        assert_eq!(model, "gpt-4o");

        let (provider, model) = app_config.ai.resolve_for_task(TaskType::Suggest);
        assert_eq!(provider, "openrouter");
        assert_eq!(model, "anthropic/claude-haiku-4.5");
    }

    #[test]
    #[serial]
    fn test_config_dir_respects_xdg_config_home() {
        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/custom/config");
        }

        let dir = config_dir();
        assert_eq!(dir, PathBuf::from("/custom/config/bugcap"));

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }
    }
}
