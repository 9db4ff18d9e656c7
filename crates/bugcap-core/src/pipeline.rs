// SPDX-License-Identifier: Apache-2.0

//! Pipeline entry point: logs and a project key in, create-issue payload out.
//!
//! Runs schema fetch, log analysis, field suggestion and payload assembly in
//! order. Schema and analysis failures abort with a structured error in the
//! response; a field suggestion failure degrades to the fallback suggestion
//! and the run still succeeds.

use std::future::Future;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::ai::{AiProvider, AiStats, SuggestionInput};
use crate::config::PipelineConfig;
use crate::error::{BugcapError, ErrorKind};
use crate::jira::{IssueTracker, IssueTypeSchema, ProjectSchema, fetch_project_schema};
use crate::normalize::ExtractionStrategy;
use crate::payload::{IssuePayload, assemble_payload};
use crate::suggestion::{IssueSuggestion, LogAnalysis, LogContext};
use crate::utils::cap_logs;

/// Pipeline input.
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRequest {
    /// Captured console logs.
    #[builder(into)]
    pub logs: String,
    /// Key of the target project.
    #[builder(into)]
    pub project_key: String,
    /// Capture session metadata.
    #[serde(default)]
    pub context: Option<LogContext>,
    /// Issue type to use instead of the default selection.
    #[serde(default)]
    #[builder(into)]
    pub issue_type_override: Option<String>,
}

/// Error reported in a failed pipeline response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineError {
    /// Classification.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl From<&BugcapError> for PipelineError {
    fn from(err: &BugcapError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Extraction strategy that won for each stage (absent on fallback).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    /// Stage 1 strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage1: Option<ExtractionStrategy>,
    /// Stage 2 strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage2: Option<ExtractionStrategy>,
}

/// Model usage for each stage that reached the completion service.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageStats {
    /// Stage 1 usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage1: Option<AiStats>,
    /// Stage 2 usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage2: Option<AiStats>,
}

/// Pipeline output envelope.
///
/// Every field that a stage produced is present, even when a later stage
/// failed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResponse {
    /// Whether a payload was produced.
    pub success: bool,
    /// Identifier of this run, for correlating logs.
    pub run_id: Uuid,
    /// Issue type the suggestion targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_issue_type: Option<String>,
    /// Stage 1 output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<LogAnalysis>,
    /// Stage 2 output (or the fallback).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<IssueSuggestion>,
    /// Stage 1 model text as received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_stage1_response: Option<String>,
    /// Stage 2 model text as received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_stage2_response: Option<String>,
    /// Project field schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_metadata: Option<ProjectSchema>,
    /// Ready-to-submit create-issue payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_payload: Option<IssuePayload>,
    /// Why the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PipelineError>,
    /// Whether Stage 2 fell back to the default suggestion.
    #[serde(rename = "stage2Fallback")]
    pub stage2_fallback: bool,
    /// Winning extraction strategies.
    pub extraction: ExtractionReport,
    /// Model usage.
    pub stats: StageStats,
}

impl PipelineResponse {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            ..Self::default()
        }
    }

    fn fail(mut self, err: &BugcapError) -> Self {
        warn!(run_id = %self.run_id, kind = ?err.kind(), error = %err, "Pipeline aborted");
        self.success = false;
        self.error = Some(PipelineError::from(err));
        self
    }

    /// Response for a run that failed before any stage started.
    #[must_use]
    pub fn from_error(err: &BugcapError) -> Self {
        Self::new().fail(err)
    }

    /// Error classification, when the run failed.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// Progress notifications, emitted after each stage completes.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Field schema is available.
    SchemaFetched {
        /// Number of issue types in the project.
        issue_types: usize,
        /// Issue type chosen for the suggestion.
        selected: String,
    },
    /// Stage 1 finished.
    LogsAnalyzed {
        /// Proposed title.
        title: String,
    },
    /// Stage 2 finished.
    FieldsSuggested {
        /// Number of suggested fields.
        fields: usize,
        /// Whether the fallback suggestion was used.
        fallback: bool,
    },
    /// Payload is ready.
    PayloadAssembled,
}

/// Runs the suggestion pipeline against injected clients.
///
/// Clients are constructed once by the host and borrowed here, so a server
/// can share them across requests.
pub struct SuggestionPipeline<'a> {
    tracker: &'a dyn IssueTracker,
    analyzer: &'a dyn AiProvider,
    suggester: &'a dyn AiProvider,
    options: PipelineConfig,
}

impl<'a> SuggestionPipeline<'a> {
    /// Creates a pipeline that uses `ai` for both model stages.
    #[must_use]
    pub fn new(
        tracker: &'a dyn IssueTracker,
        ai: &'a dyn AiProvider,
        options: PipelineConfig,
    ) -> Self {
        Self::with_stage_providers(tracker, ai, ai, options)
    }

    /// Creates a pipeline with a separate provider per model stage.
    #[must_use]
    pub fn with_stage_providers(
        tracker: &'a dyn IssueTracker,
        analyzer: &'a dyn AiProvider,
        suggester: &'a dyn AiProvider,
        options: PipelineConfig,
    ) -> Self {
        Self {
            tracker,
            analyzer,
            suggester,
            options,
        }
    }

    /// Runs the pipeline. Failures are reported inside the response.
    pub async fn run(&self, request: &PipelineRequest) -> PipelineResponse {
        self.run_with_events(request, |_| {}).await
    }

    /// Runs the pipeline, calling `on_event` after each stage.
    #[instrument(skip_all, fields(project = %request.project_key))]
    pub async fn run_with_events<F>(
        &self,
        request: &PipelineRequest,
        mut on_event: F,
    ) -> PipelineResponse
    where
        F: FnMut(&PipelineEvent) + Send,
    {
        let mut response = PipelineResponse::new();
        debug!(run_id = %response.run_id, "Starting pipeline run");

        if request.logs.trim().is_empty() {
            return response.fail(&BugcapError::InvalidInput {
                message: "logs are required".to_string(),
            });
        }
        let project_key = request.project_key.trim();
        if project_key.is_empty() {
            return response.fail(&BugcapError::InvalidInput {
                message: "project key is required".to_string(),
            });
        }

        // Schema
        let schema = match self
            .within_deadline(fetch_project_schema(self.tracker, project_key))
            .await
        {
            Some(Ok(schema)) => schema,
            Some(Err(e)) => return response.fail(&e),
            None => {
                return response.fail(&BugcapError::upstream(
                    "Jira",
                    format!("schema fetch timed out after {}s", self.options.stage_timeout_seconds),
                ));
            }
        };

        let issue_type = match select_issue_type(
            &schema,
            request.issue_type_override.as_deref(),
            &self.options.default_issue_type,
        ) {
            Ok(issue_type) => issue_type.clone(),
            Err(e) => {
                response.jira_metadata = Some(schema);
                return response.fail(&e);
            }
        };
        on_event(&PipelineEvent::SchemaFetched {
            issue_types: schema.issue_types.len(),
            selected: issue_type.name.clone(),
        });
        response.selected_issue_type = Some(issue_type.name.clone());

        // Stage 1
        let logs = cap_logs(&request.logs, self.options.max_log_chars);
        let context = request.context.clone().unwrap_or_default();
        let stage1 = match self
            .within_deadline(self.analyzer.analyze_logs(
                &logs,
                &context,
                self.options.analyze_max_tokens,
            ))
            .await
        {
            Some(Ok(output)) => output,
            Some(Err(e)) => {
                response.jira_metadata = Some(schema);
                return response.fail(&BugcapError::LogAnalysisFailed {
                    message: format!("{e:#}"),
                });
            }
            None => {
                response.jira_metadata = Some(schema);
                return response.fail(&BugcapError::LogAnalysisFailed {
                    message: format!(
                        "timed out after {}s",
                        self.options.stage_timeout_seconds
                    ),
                });
            }
        };
        on_event(&PipelineEvent::LogsAnalyzed {
            title: stage1.value.ticket_title.clone(),
        });
        response.extraction.stage1 = stage1.strategy;
        response.stats.stage1 = Some(stage1.stats);
        response.raw_stage1_response = Some(stage1.raw);
        let analysis = stage1.value;

        // Stage 2
        let available: Vec<&str> = schema.issue_types.iter().map(|t| t.name.as_str()).collect();
        let input = SuggestionInput {
            logs: &logs,
            analysis: &analysis,
            issue_type: &issue_type,
            project: &schema.project,
            available_issue_types: &available,
            max_tokens: self.options.suggest_max_tokens,
        };
        let suggestions = match self
            .within_deadline(self.suggester.suggest_field_values(input))
            .await
        {
            Some(Ok(output)) => {
                response.stage2_fallback = output.is_fallback();
                response.extraction.stage2 = output.strategy;
                response.stats.stage2 = Some(output.stats);
                response.raw_stage2_response = Some(output.raw);
                output.value
            }
            Some(Err(e)) => {
                warn!(error = %e, "Field suggestion failed, using fallback");
                response.stage2_fallback = true;
                IssueSuggestion::fallback(&issue_type.name, &format!("{e:#}"), None)
            }
            None => {
                warn!("Field suggestion timed out, using fallback");
                response.stage2_fallback = true;
                IssueSuggestion::fallback(
                    &issue_type.name,
                    &format!("timed out after {}s", self.options.stage_timeout_seconds),
                    None,
                )
            }
        };
        on_event(&PipelineEvent::FieldsSuggested {
            fields: suggestions.field_values.len(),
            fallback: response.stage2_fallback,
        });

        // Assemble
        let payload = assemble_payload(&suggestions, &schema.project.key);
        on_event(&PipelineEvent::PayloadAssembled);

        info!(
            run_id = %response.run_id,
            issue_type = %issue_type.name,
            fallback = response.stage2_fallback,
            "Pipeline run complete"
        );

        response.success = true;
        response.analysis = Some(analysis);
        response.suggestions = Some(suggestions);
        response.jira_metadata = Some(schema);
        response.jira_payload = Some(payload);
        response
    }

    /// Awaits `fut` within the per-stage deadline; `None` on timeout.
    async fn within_deadline<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        let limit = Duration::from_secs(self.options.stage_timeout_seconds);
        tokio::time::timeout(limit, fut).await.ok()
    }
}

/// Picks the issue type the suggestion targets.
///
/// An explicit override must exist in the project. Otherwise the configured
/// default is used when present, then the first non-subtask type, then the
/// first type.
///
/// # Errors
///
/// Returns `NotFound` if the override names an unknown type or the project
/// has no issue types.
pub fn select_issue_type<'s>(
    schema: &'s ProjectSchema,
    override_name: Option<&str>,
    default_name: &str,
) -> crate::Result<&'s IssueTypeSchema> {
    if let Some(name) = override_name.map(str::trim).filter(|n| !n.is_empty()) {
        return schema.issue_type(name).ok_or_else(|| BugcapError::NotFound {
            resource: "Issue type".to_string(),
            message: format!(
                "'{name}' is not an issue type of {} (available: {})",
                schema.project.key,
                schema.issue_type_names().join(", ")
            ),
        });
    }

    schema
        .issue_type(default_name)
        .or_else(|| schema.issue_types.iter().find(|t| !t.is_subtask))
        .or_else(|| schema.issue_types.first())
        .ok_or_else(|| BugcapError::NotFound {
            resource: "Issue type".to_string(),
            message: format!("project '{}' has no issue types", schema.project.key),
        })
}
