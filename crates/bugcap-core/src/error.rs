// SPDX-License-Identifier: Apache-2.0

//! Error types for bugcap.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while producing an issue suggestion.
#[derive(Error, Debug)]
pub enum BugcapError {
    /// Required credentials are not configured.
    #[error("{service} credentials are not configured - set the {env_var} environment variable")]
    MissingCredentials {
        /// Service that needs the credential (e.g., `Jira`, `openai`).
        service: String,
        /// Environment variable that supplies it.
        env_var: String,
    },

    /// Configuration file error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// Caller supplied an unusable request.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// Project or issue type does not exist (or is not visible to the credentials).
    #[error("{resource} not found: {message}")]
    NotFound {
        /// Kind of resource that was looked up (e.g., "Project", "Issue type").
        resource: String,
        /// Error message.
        message: String,
    },

    /// HTTP or network failure talking to the tracker or the completion service.
    #[error("{service} request failed: {message}")]
    Upstream {
        /// Name of the upstream service.
        service: String,
        /// Error message.
        message: String,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
    },

    /// Stage 1 could not obtain a completion from the model.
    #[error("Log analysis failed: {message}")]
    LogAnalysisFailed {
        /// Underlying cause.
        message: String,
    },

    /// Model output was not valid JSON under any extraction strategy.
    #[error("Could not parse AI response: {message}")]
    ResponseParse {
        /// Last parse error encountered.
        message: String,
    },

    /// Rate limit exceeded from an AI provider.
    #[error("Rate limit exceeded on {provider}, retry after {retry_after}s")]
    RateLimited {
        /// Name of the provider that rate limited.
        provider: String,
        /// Number of seconds to wait before retrying.
        retry_after: u64,
    },

    /// Circuit breaker is open - AI provider is unavailable.
    #[error("Circuit breaker is open - AI provider is temporarily unavailable")]
    CircuitOpen,

    /// Network/HTTP error from reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Coarse error classification reported to pipeline callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing credentials or broken configuration.
    Configuration,
    /// Request was rejected before any upstream call.
    InvalidInput,
    /// Project or issue type absent.
    NotFound,
    /// Tracker or completion service failure.
    UpstreamCallFailed,
    /// Stage 1 produced no completion.
    LogAnalysisFailed,
}

impl BugcapError {
    /// Classifies this error for the pipeline response envelope.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            BugcapError::MissingCredentials { .. } | BugcapError::Config { .. } => {
                ErrorKind::Configuration
            }
            BugcapError::InvalidInput { .. } => ErrorKind::InvalidInput,
            BugcapError::NotFound { .. } => ErrorKind::NotFound,
            BugcapError::LogAnalysisFailed { .. } => ErrorKind::LogAnalysisFailed,
            BugcapError::Upstream { .. }
            | BugcapError::ResponseParse { .. }
            | BugcapError::RateLimited { .. }
            | BugcapError::CircuitOpen
            | BugcapError::Network(_) => ErrorKind::UpstreamCallFailed,
        }
    }

    /// Shorthand for an upstream failure without an HTTP status.
    pub(crate) fn upstream(service: &str, message: impl Into<String>) -> Self {
        BugcapError::Upstream {
            service: service.to_string(),
            message: message.into(),
            status: None,
        }
    }
}

impl From<config::ConfigError> for BugcapError {
    fn from(err: config::ConfigError) -> Self {
        BugcapError::Config {
            message: err.to_string(),
        }
    }
}
