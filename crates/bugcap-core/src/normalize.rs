// SPDX-License-Identifier: Apache-2.0

//! Response normalizer: pulls a typed JSON object out of raw model output.
//!
//! Models wrap JSON in code fences or surround it with prose. Extraction runs
//! an ordered list of strategies; the first one whose candidate parses *and*
//! deserializes into the requested type wins. When every strategy fails the
//! caller gets a `ResponseParse` error and builds its own fallback. A
//! half-parsed value is never returned.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::BugcapError;

/// Matches a fenced block, optionally tagged `json`, and captures its body.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[jJ][sS][oO][nN])?[ \t]*\r?\n?(.*?)```").expect("valid fence regex")
});

/// How a JSON object was located in a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Contents of a Markdown code fence.
    FencedBlock,
    /// First balanced `{...}` span in surrounding prose.
    EmbeddedObject,
    /// The whole response.
    FullText,
}

impl ExtractionStrategy {
    /// Strategies in the order they are attempted.
    pub const ORDER: [ExtractionStrategy; 3] = [
        ExtractionStrategy::FencedBlock,
        ExtractionStrategy::EmbeddedObject,
        ExtractionStrategy::FullText,
    ];

    /// Runs this strategy against `raw`.
    pub fn extract(self, raw: &str) -> Result<Value, ParseError> {
        match self {
            ExtractionStrategy::FencedBlock => extract_fenced(raw),
            ExtractionStrategy::EmbeddedObject => extract_embedded(raw),
            ExtractionStrategy::FullText => parse_candidate(raw.trim()),
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionStrategy::FencedBlock => "fenced block",
            ExtractionStrategy::EmbeddedObject => "embedded object",
            ExtractionStrategy::FullText => "full text",
        };
        f.write_str(name)
    }
}

/// Why a single strategy failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The strategy found nothing to parse.
    NoCandidate,
    /// A candidate was found but is not valid JSON.
    InvalidJson(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NoCandidate => f.write_str("no JSON candidate found"),
            ParseError::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
        }
    }
}

/// A successfully normalized response.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    /// Typed value.
    pub value: T,
    /// Strategy that produced it.
    pub strategy: ExtractionStrategy,
}

/// Extracts and deserializes a `T` from raw model output.
///
/// # Errors
///
/// Returns `BugcapError::ResponseParse` with the last failure when no
/// strategy yields a valid `T`.
pub fn normalize<T: DeserializeOwned>(raw: &str) -> crate::Result<Normalized<T>> {
    let mut last_error = ParseError::NoCandidate.to_string();

    for strategy in ExtractionStrategy::ORDER {
        let value = match strategy.extract(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(%strategy, error = %e, "Extraction strategy failed");
                if e != ParseError::NoCandidate {
                    last_error = e.to_string();
                }
                continue;
            }
        };

        match serde_json::from_value::<T>(value) {
            Ok(value) => {
                debug!(%strategy, "Normalized AI response");
                return Ok(Normalized { value, strategy });
            }
            Err(e) => {
                debug!(%strategy, error = %e, "Extracted JSON has the wrong shape");
                last_error = format!("unexpected shape: {e}");
            }
        }
    }

    Err(BugcapError::ResponseParse {
        message: last_error,
    })
}

fn parse_candidate(candidate: &str) -> Result<Value, ParseError> {
    if candidate.is_empty() {
        return Err(ParseError::NoCandidate);
    }
    serde_json::from_str(candidate).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

fn extract_fenced(raw: &str) -> Result<Value, ParseError> {
    let body = FENCED_BLOCK
        .captures(raw)
        .and_then(|c| c.get(1))
        .ok_or(ParseError::NoCandidate)?;
    parse_candidate(body.as_str().trim())
}

fn extract_embedded(raw: &str) -> Result<Value, ParseError> {
    let start = raw.find('{').ok_or(ParseError::NoCandidate)?;
    let remainder = &raw[start..];
    let end = find_matching_brace(remainder).ok_or(ParseError::NoCandidate)?;
    parse_candidate(&remainder[..end])
}

/// Byte offset just past the brace closing the one at `s[0]`.
///
/// Braces inside JSON strings are ignored.
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        title: String,
        count: u32,
    }

    #[test]
    fn test_fenced_json_block() {
        let original = json!({"title": "Payment crash", "count": 2});
        let raw = format!(
            "Here you go:\n```json\n{}\n```\nLet me know!",
            serde_json::to_string_pretty(&original).unwrap()
        );

        let normalized = normalize::<Value>(&raw).unwrap();
        assert_eq!(normalized.value, original);
        assert_eq!(normalized.strategy, ExtractionStrategy::FencedBlock);
    }

    #[test]
    fn test_untagged_fence() {
        let raw = "```\n{\"title\": \"x\", \"count\": 1}\n```";
        let normalized = normalize::<Sample>(raw).unwrap();
        assert_eq!(normalized.value.count, 1);
        assert_eq!(normalized.strategy, ExtractionStrategy::FencedBlock);
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let raw = "Sure! The analysis is {\"title\": \"Timeout {retry}\", \"count\": 3} - hope that helps.";
        let normalized = normalize::<Sample>(raw).unwrap();
        assert_eq!(
            normalized.value,
            Sample {
                title: "Timeout {retry}".to_string(),
                count: 3
            }
        );
        assert_eq!(normalized.strategy, ExtractionStrategy::EmbeddedObject);
    }

    #[test]
    fn test_bare_json_uses_embedded_strategy() {
        let normalized = normalize::<Sample>("{\"title\": \"a\", \"count\": 0}").unwrap();
        assert_eq!(normalized.strategy, ExtractionStrategy::EmbeddedObject);
    }

    #[test]
    fn test_full_text_fallthrough_for_non_object_json() {
        let normalized = normalize::<Vec<u32>>("  [1, 2, 3]  ").unwrap();
        assert_eq!(normalized.value, vec![1, 2, 3]);
        assert_eq!(normalized.strategy, ExtractionStrategy::FullText);
    }

    #[test]
    fn test_fence_with_other_language_falls_back_to_embedded() {
        let raw = "```text\n{\"title\": \"ok\", \"count\": 9}\n```";
        let normalized = normalize::<Sample>(raw).unwrap();
        assert_eq!(normalized.value.count, 9);
        assert_eq!(normalized.strategy, ExtractionStrategy::EmbeddedObject);
    }

    #[test]
    fn test_broken_fence_is_parse_error() {
        let err = normalize::<Sample>("```json\n{not json}\n```").unwrap_err();
        assert!(matches!(err, BugcapError::ResponseParse { .. }));
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let err = normalize::<Sample>("{\"unexpected\": true}").unwrap_err();
        assert!(matches!(err, BugcapError::ResponseParse { .. }));
    }

    #[test]
    fn test_plain_prose_is_parse_error() {
        let err = normalize::<Value>("I could not analyze these logs.").unwrap_err();
        match err {
            BugcapError::ResponseParse { message } => assert!(message.contains("JSON")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(
            extract_embedded("prefix { \"a\": 1"),
            Err(ParseError::NoCandidate)
        );
        assert_eq!(find_matching_brace("{\"a\": \"}\"}"), Some(10));
    }
}
