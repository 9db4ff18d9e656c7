// SPDX-License-Identifier: Apache-2.0

//! AI provider trait and the two model stages built on it.
//!
//! Defines the `AiProvider` trait with default implementations for request
//! sending, retry, circuit breaking and the log-analysis and field-suggestion
//! stages. Implementors only supply configuration accessors; tests override
//! `send_request_inner` to replay canned responses.

use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use tracing::{debug, instrument, warn};

use super::circuit_breaker::CircuitBreaker;
use super::prompts;
use super::types::{AiStats, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Completion};
use crate::jira::{IssueTypeSchema, ProjectInfo};
use crate::normalize::{ExtractionStrategy, normalize};
use crate::suggestion::{IssueSuggestion, LogAnalysis, LogContext};

/// Temperature used for log analysis.
pub const ANALYZE_TEMPERATURE: f32 = 0.3;

/// Result of one model stage: the typed value plus what produced it.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    /// Parsed value, or the stage's fallback when parsing failed.
    pub value: T,
    /// Model response exactly as received.
    pub raw: String,
    /// Winning extraction strategy; `None` when `value` is a fallback.
    pub strategy: Option<ExtractionStrategy>,
    /// Usage statistics for the call.
    pub stats: AiStats,
}

impl<T> StageOutput<T> {
    /// Whether `value` came from the fallback path.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.strategy.is_none()
    }
}

/// Everything Stage 2 needs to propose field values.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionInput<'a> {
    /// Capped console logs.
    pub logs: &'a str,
    /// Stage 1 output.
    pub analysis: &'a LogAnalysis,
    /// Schema of the selected issue type.
    pub issue_type: &'a IssueTypeSchema,
    /// Target project.
    pub project: &'a ProjectInfo,
    /// Names of every issue type in the project.
    pub available_issue_types: &'a [&'a str],
    /// Token budget for the response.
    pub max_tokens: u32,
}

/// AI provider trait for log analysis and field suggestion.
///
/// Defines the interface that all AI providers must implement.
/// Default implementations are provided for shared logic.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "openai", "groq").
    fn name(&self) -> &str;

    /// Returns the API URL for this provider.
    fn api_url(&self) -> &str;

    /// Returns the environment variable name for the API key.
    fn api_key_env(&self) -> &str;

    /// Returns the HTTP client for making requests.
    fn http_client(&self) -> &Client;

    /// Returns the API key for authentication.
    fn api_key(&self) -> &SecretString;

    /// Returns the model name.
    fn model(&self) -> &str;

    /// Returns the default maximum tokens for API responses.
    fn max_tokens(&self) -> u32;

    /// Returns the temperature for API requests.
    fn temperature(&self) -> f32;

    /// Returns the circuit breaker for this provider (optional).
    ///
    /// Default implementation returns None. Providers can override
    /// to provide circuit breaker functionality.
    fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        None
    }

    /// Builds HTTP headers for API requests.
    ///
    /// Default implementation sets Content-Type. Providers can override
    /// to add custom headers.
    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(val) = "application/json".parse() {
            headers.insert("Content-Type", val);
        }
        headers
    }

    /// Sends a chat completion request to the provider's API (HTTP-only, no retry).
    ///
    /// Default implementation handles auth headers and error responses
    /// (401, 429, other non-2xx).
    async fn send_request_inner(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        use secrecy::ExposeSecret;

        use crate::error::BugcapError;

        let mut req = self.http_client().post(self.api_url());

        req = req.header(
            "Authorization",
            format!("Bearer {}", self.api_key().expose_secret()),
        );

        for (key, value) in &self.build_headers() {
            req = req.header(key.clone(), value.clone());
        }

        let response = req
            .json(request)
            .send()
            .await
            .map_err(BugcapError::Network)?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 401 {
                anyhow::bail!(
                    "Invalid {} API key. Check your {} environment variable.",
                    self.name(),
                    self.api_key_env()
                );
            } else if status.as_u16() == 429 {
                warn!("Rate limited by {} API", self.name());
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(0);
                debug!(retry_after, "Parsed Retry-After header");
                return Err(BugcapError::RateLimited {
                    provider: self.name().to_string(),
                    retry_after,
                }
                .into());
            }
            let error_body = response.text().await.unwrap_or_default();
            return Err(BugcapError::Upstream {
                service: self.name().to_string(),
                message: format!("HTTP {}: {error_body}", status.as_u16()),
                status: Some(status.as_u16()),
            }
            .into());
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context(format!("Failed to parse {} API response", self.name()))?;

        Ok(completion)
    }

    /// Sends a completion request with retry and circuit breaker handling.
    ///
    /// Returns the text of the first choice untouched; interpreting it is
    /// the caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error if the circuit is open, the request keeps failing
    /// after retries, or the response has no choices.
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Completion> {
        use backon::Retryable;

        use crate::error::BugcapError;
        use crate::retry::{extract_retry_after, is_retryable_anyhow, retry_backoff};

        if let Some(cb) = self.circuit_breaker()
            && cb.is_open()
        {
            return Err(BugcapError::CircuitOpen.into());
        }

        // Measured outside the retry loop so retries count toward the total.
        let start = Instant::now();

        let result = (|| async {
            match self.send_request_inner(request).await {
                Ok(completion) => Ok(completion),
                Err(e) => {
                    if let Some(delay) = extract_retry_after(&e) {
                        tokio::time::sleep(delay).await;
                    }
                    Err(e)
                }
            }
        })
        .retry(retry_backoff())
        .when(is_retryable_anyhow)
        .notify(|err, dur| warn!(error = %err, delay = ?dur, "Retrying after error"))
        .await;

        let completion = match result {
            Ok(completion) => {
                if let Some(cb) = self.circuit_breaker() {
                    cb.record_success();
                }
                completion
            }
            Err(e) => {
                if let Some(cb) = self.circuit_breaker() {
                    cb.record_failure();
                }
                return Err(e);
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        let (input_tokens, output_tokens) = if let Some(usage) = &completion.usage {
            (usage.prompt_tokens, usage.completion_tokens)
        } else {
            debug!("No usage information in API response");
            (0, 0)
        };

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("No response from AI model")?;
        debug!(response_length = text.len(), "Received AI response");

        Ok(Completion {
            text,
            stats: AiStats {
                model: self.model().to_string(),
                input_tokens,
                output_tokens,
                duration_ms,
            },
        })
    }

    /// Stage 1: summarizes console logs into a title and Markdown summary.
    ///
    /// An unparseable response is not an error: the analysis falls back to
    /// [`LogAnalysis::unparsed`] carrying the raw text.
    ///
    /// # Errors
    ///
    /// Returns an error if no completion could be obtained.
    #[instrument(skip(self, logs, context), fields(log_chars = logs.len()))]
    async fn analyze_logs(
        &self,
        logs: &str,
        context: &LogContext,
        max_tokens: u32,
    ) -> Result<StageOutput<LogAnalysis>> {
        debug!(model = %self.model(), "Calling {} API for log analysis", self.name());

        let request = ChatCompletionRequest {
            model: self.model().to_string(),
            messages: vec![
                ChatMessage::system(prompts::LOG_ANALYZER_SYSTEM_PROMPT),
                ChatMessage::user(prompts::build_analyze_user_prompt(logs, context)),
            ],
            max_tokens: Some(max_tokens),
            temperature: Some(ANALYZE_TEMPERATURE),
        };

        let completion = self.complete(&request).await?;

        let (value, strategy) = match normalize::<LogAnalysis>(&completion.text) {
            Ok(normalized) => (normalized.value, Some(normalized.strategy)),
            Err(e) => {
                warn!(error = %e, "Log analysis response was not valid JSON");
                (LogAnalysis::unparsed(&completion.text), None)
            }
        };

        debug!(
            input_tokens = completion.stats.input_tokens,
            output_tokens = completion.stats.output_tokens,
            duration_ms = completion.stats.duration_ms,
            "Log analysis complete"
        );

        Ok(StageOutput {
            value,
            raw: completion.text,
            strategy,
            stats: completion.stats,
        })
    }

    /// Stage 2: proposes a value for each schema field.
    ///
    /// The parsed suggestion is filtered to the schema and completed with
    /// any missing mandatory key. An unparseable response yields
    /// [`IssueSuggestion::fallback`].
    ///
    /// # Errors
    ///
    /// Returns an error if no completion could be obtained. Callers degrade
    /// that to the fallback as well.
    #[instrument(skip(self, input), fields(issue_type = %input.issue_type.name))]
    async fn suggest_field_values(
        &self,
        input: SuggestionInput<'_>,
    ) -> Result<StageOutput<IssueSuggestion>> {
        debug!(model = %self.model(), "Calling {} API for field suggestion", self.name());

        let request = ChatCompletionRequest {
            model: self.model().to_string(),
            messages: vec![
                ChatMessage::system(prompts::FIELD_VALUE_EXPERT_SYSTEM_PROMPT),
                ChatMessage::user(prompts::build_suggest_user_prompt(
                    input.logs,
                    input.analysis,
                    input.issue_type,
                    input.project,
                    input.available_issue_types,
                )),
            ],
            max_tokens: Some(input.max_tokens),
            temperature: Some(self.temperature()),
        };

        let completion = self.complete(&request).await?;

        let (value, strategy) = match normalize::<IssueSuggestion>(&completion.text) {
            Ok(normalized) => {
                let mut suggestion = normalized.value;
                suggestion.retain_schema_fields(input.issue_type);
                suggestion.ensure_mandatory(input.analysis, &input.issue_type.name);
                (suggestion, Some(normalized.strategy))
            }
            Err(e) => {
                warn!(error = %e, "Field suggestion response was not valid JSON, using fallback");
                let fallback = IssueSuggestion::fallback(
                    &input.issue_type.name,
                    &e.to_string(),
                    Some(&completion.text),
                );
                (fallback, None)
            }
        };

        debug!(
            fields = value.field_values.len(),
            min_confidence = value.min_confidence(),
            duration_ms = completion.stats.duration_ms,
            "Field suggestion complete"
        );

        Ok(StageOutput {
            value,
            raw: completion.text,
            strategy,
            stats: completion.stats,
        })
    }
}
