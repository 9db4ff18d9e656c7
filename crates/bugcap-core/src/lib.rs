// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # bugcap Core
//!
//! Core library for bugcap - turn captured console logs into AI-suggested
//! Jira issues.
//!
//! This crate provides reusable components for:
//! - Jira integration (project issue types and create-screen field schema)
//! - Two-stage AI suggestion (log analysis, field value suggestion)
//! - Response normalization for model output
//! - Create-issue payload assembly
//! - Configuration management
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bugcap_core::{EnvCredentialProvider, PipelineClients, PipelineRequest, load_config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = load_config()?;
//! let credentials = EnvCredentialProvider::new(&config.jira);
//!
//! // Build clients once, reuse for many runs
//! let clients = PipelineClients::from_config(&credentials, &config)?;
//!
//! let request = PipelineRequest::builder()
//!     .logs("Uncaught TypeError: Cannot read properties of undefined (reading 'total')")
//!     .project_key("PMT")
//!     .build();
//!
//! let response = clients.pipeline(&config).run(&request).await;
//! if let Some(payload) = response.jira_payload {
//!     println!("{}", serde_json::to_string_pretty(&payload)?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ai`] - Completion providers and the two model stages
//! - [`config`] - Configuration loading and paths
//! - [`error`] - Error types
//! - [`jira`] - Jira API and the field schema fetcher
//! - [`normalize`] - JSON extraction from model output
//! - [`payload`] - Create-issue payload assembly
//! - [`pipeline`] - Pipeline entry point

// ============================================================================
// Authentication
// ============================================================================

pub use auth::{CredentialProvider, EnvCredentialProvider, JiraCredentials};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{BugcapError, ErrorKind};

/// Convenience Result type for bugcap operations.
///
/// This is equivalent to `std::result::Result<T, BugcapError>`.
pub type Result<T> = std::result::Result<T, BugcapError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    AiConfig, AppConfig, JiraConfig, PipelineConfig, ServerConfig, TaskType, config_dir,
    config_file_path, load_config,
};

// ============================================================================
// AI Stages
// ============================================================================

pub use ai::{AiClient, AiProvider, AiStats, ProviderConfig, all_providers, get_provider};

// ============================================================================
// Jira Integration
// ============================================================================

pub use jira::{
    Field, IssueTracker, IssueTypeSchema, JiraClient, ProjectInfo, ProjectSchema,
    fetch_project_schema,
};

// ============================================================================
// Pipeline
// ============================================================================

pub use normalize::{ExtractionStrategy, Normalized, normalize};
pub use payload::{IssuePayload, assemble_payload};
pub use pipeline::{
    PipelineError, PipelineEvent, PipelineRequest, PipelineResponse, SuggestionPipeline,
    select_issue_type,
};
pub use suggestion::{
    CaptureTime, IssueSuggestion, LogAnalysis, LogContext, MediaDescriptor, MediaKind,
};

// ============================================================================
// Retry Logic
// ============================================================================

pub use retry::{is_retryable_anyhow, is_retryable_http, retry_backoff};

// ============================================================================
// Utilities
// ============================================================================

pub use utils::truncate_with_suffix;

// ============================================================================
// Platform-Agnostic Facade
// ============================================================================

pub use facade::{
    PipelineClients, build_ai_client, build_jira_client, fetch_schema, suggest_issue,
};

// ============================================================================
// Modules
// ============================================================================

pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod facade;
pub mod jira;
pub mod normalize;
pub mod payload;
pub mod pipeline;
pub mod retry;
pub mod suggestion;
pub mod utils;
