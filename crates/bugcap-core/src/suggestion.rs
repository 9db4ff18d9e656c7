// SPDX-License-Identifier: Apache-2.0

//! Stage outputs: the log analysis and the per-field issue suggestion.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::jira::IssueTypeSchema;
use crate::utils::truncate_with_suffix;

/// Keys every suggestion carries, regardless of the field schema.
pub const MANDATORY_KEYS: [&str; 4] = ["summary", "description", "issuetype", "priority"];

/// Title used when Stage 1 output cannot be parsed.
pub const UNPARSED_ANALYSIS_TITLE: &str = "Failed to parse AI response";

/// Summary used by the fallback suggestion.
pub const FALLBACK_SUMMARY: &str = "Agent 2 failed to process";

/// Priority used by the fallback suggestion and for missing priorities.
pub const DEFAULT_PRIORITY: &str = "Medium";

/// Confidence attached to every fallback or filled-in value.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

const MAX_RAW_IN_DESCRIPTION: usize = 4000;

/// Stage 1 output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAnalysis {
    /// Proposed issue title.
    pub ticket_title: String,
    /// Markdown summary of what went wrong.
    pub summary_markdown: String,
}

impl LogAnalysis {
    /// Analysis used when the model response is not parseable; keeps the raw text.
    #[must_use]
    pub fn unparsed(raw: &str) -> Self {
        Self {
            ticket_title: UNPARSED_ANALYSIS_TITLE.to_string(),
            summary_markdown: raw.to_string(),
        }
    }
}

/// Kind of captured media attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still screenshot.
    Screenshot,
    /// Screen recording.
    Video,
    /// Any kind this crate does not model.
    #[serde(other)]
    Other,
}

/// Descriptor of one captured screenshot or recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    /// Media kind.
    pub kind: MediaKind,
    /// File name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Recording length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

/// Capture time as sent by the caller.
///
/// Browsers commonly send `Date.now()` milliseconds instead of an RFC 3339
/// string; anything else is kept verbatim for the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptureTime {
    /// RFC 3339 instant.
    Instant(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// Unrecognized shape.
    Raw(Value),
}

impl CaptureTime {
    /// The instant this value denotes, if it denotes one.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Instant(at) => Some(*at),
            Self::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
            Self::Raw(_) => None,
        }
    }
}

impl From<DateTime<Utc>> for CaptureTime {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Instant(at)
    }
}

/// Free-form metadata about the capture session, forwarded to Stage 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogContext {
    /// When the logs were captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<CaptureTime>,
    /// Where the logs came from (e.g. "browser-console").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Attached screenshots and recordings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaDescriptor>,
    /// Any other caller-supplied keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stage 2 output: suggested value, confidence and rationale per field key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSuggestion {
    /// Suggested value per field key.
    pub field_values: Map<String, Value>,
    /// Confidence in `0..=1` per field key.
    #[serde(default, deserialize_with = "skip_invalid_entries")]
    pub confidence: BTreeMap<String, f64>,
    /// Short rationale per field key.
    #[serde(default, deserialize_with = "skip_invalid_entries")]
    pub reasoning: BTreeMap<String, String>,
}

/// Reads a per-field map, dropping null or mistyped entries.
///
/// A non-object map reads as empty.
fn skip_invalid_entries<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| serde_json::from_value(value).ok().map(|v| (key, v)))
        .collect())
}

impl IssueSuggestion {
    /// The one fallback suggestion used whenever Stage 2 is unavailable.
    ///
    /// `reason` and `raw_response` end up in the description so the failure
    /// stays diagnosable from the issue itself.
    #[must_use]
    pub fn fallback(issue_type: &str, reason: &str, raw_response: Option<&str>) -> Self {
        let mut description = format!(
            "Automatic field suggestion failed ({reason}). Review the captured logs and \
             complete this issue manually."
        );
        if let Some(raw) = raw_response.filter(|r| !r.trim().is_empty()) {
            description.push_str("\n\nRaw AI response:\n```\n");
            description.push_str(&truncate_with_suffix(
                raw,
                MAX_RAW_IN_DESCRIPTION,
                "\n[truncated]",
            ));
            description.push_str("\n```");
        }

        let mut field_values = Map::new();
        field_values.insert("summary".to_string(), json!(FALLBACK_SUMMARY));
        field_values.insert("description".to_string(), json!(description));
        field_values.insert("issuetype".to_string(), json!({ "name": issue_type }));
        field_values.insert("priority".to_string(), json!({ "name": DEFAULT_PRIORITY }));
        field_values.insert("labels".to_string(), json!(["error", "failed"]));

        let confidence = field_values
            .keys()
            .map(|k| (k.clone(), FALLBACK_CONFIDENCE))
            .collect();
        let reasoning = field_values
            .keys()
            .map(|k| (k.clone(), format!("Fallback value: {reason}")))
            .collect();

        Self {
            field_values,
            confidence,
            reasoning,
        }
    }

    /// Drops keys that are neither mandatory nor fields of `issue_type`.
    ///
    /// Null values and out-of-range confidences are cleaned up on the way.
    pub fn retain_schema_fields(&mut self, issue_type: &IssueTypeSchema) {
        let allowed = |key: &str| MANDATORY_KEYS.contains(&key) || issue_type.has_field(key);

        let unknown: Vec<String> = self
            .field_values
            .keys()
            .filter(|k| !allowed(k.as_str()))
            .cloned()
            .collect();
        for key in &unknown {
            warn!(field = %key, "Dropping suggested field not in schema");
            self.field_values.remove(key);
        }
        self.field_values
            .retain(|k, v| MANDATORY_KEYS.contains(&k.as_str()) || !v.is_null());

        self.confidence.retain(|k, _| self.field_values.contains_key(k));
        self.reasoning.retain(|k, _| self.field_values.contains_key(k));
        for score in self.confidence.values_mut() {
            *score = if score.is_finite() {
                score.clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
    }

    /// Fills any missing mandatory key from the Stage 1 analysis.
    pub fn ensure_mandatory(&mut self, analysis: &LogAnalysis, issue_type: &str) {
        let defaults = [
            ("summary", json!(analysis.ticket_title)),
            ("description", json!(analysis.summary_markdown)),
            ("issuetype", json!({ "name": issue_type })),
            ("priority", json!({ "name": DEFAULT_PRIORITY })),
        ];

        for (key, value) in defaults {
            if is_present(self.field_values.get(key)) {
                continue;
            }
            self.field_values.insert(key.to_string(), value);
            self.confidence.insert(key.to_string(), FALLBACK_CONFIDENCE);
            self.reasoning.insert(
                key.to_string(),
                "Not suggested by the model; filled from the log analysis".to_string(),
            );
        }
    }

    /// Lowest confidence across all fields (1.0 when empty).
    #[must_use]
    pub fn min_confidence(&self) -> f64 {
        self.confidence.values().copied().fold(1.0, f64::min)
    }
}

/// Whether a field value carries information worth sending.
///
/// `None`, `null`, blank strings and empty arrays/objects are absent.
#[must_use]
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}
