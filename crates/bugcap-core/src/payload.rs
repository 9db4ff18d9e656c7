// SPDX-License-Identifier: Apache-2.0

//! Payload assembler: turns a suggestion into a create-issue request body.
//!
//! Pure and total. Mandatory keys are always emitted; optional keys only
//! when they carry a value. Shorthand values are reshaped into the object
//! forms the tracker expects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::suggestion::{DEFAULT_PRIORITY, FALLBACK_SUMMARY, IssueSuggestion, is_present};

/// Ready-to-submit create-issue request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePayload {
    /// Target project key.
    pub project_key: String,
    /// Field map, including `project`.
    pub fields: Map<String, Value>,
}

/// Builds the create-issue payload for `project_key` from a suggestion.
#[must_use]
pub fn assemble_payload(suggestion: &IssueSuggestion, project_key: &str) -> IssuePayload {
    let values = &suggestion.field_values;
    let mut fields = Map::new();

    fields.insert("project".to_string(), json!({ "key": project_key }));
    fields.insert(
        "summary".to_string(),
        values
            .get("summary")
            .filter(|v| is_present(Some(*v)))
            .cloned()
            .unwrap_or_else(|| json!(FALLBACK_SUMMARY)),
    );
    fields.insert(
        "description".to_string(),
        values
            .get("description")
            .filter(|v| is_present(Some(*v)))
            .cloned()
            .unwrap_or_else(|| json!("")),
    );
    fields.insert(
        "issuetype".to_string(),
        named(values.get("issuetype")).unwrap_or_else(|| json!({ "name": "Bug" })),
    );
    fields.insert(
        "priority".to_string(),
        named(values.get("priority")).unwrap_or_else(|| json!({ "name": DEFAULT_PRIORITY })),
    );

    for (key, value) in values {
        if fields.contains_key(key) || !is_present(Some(value)) {
            continue;
        }
        fields.insert(key.clone(), shape_optional(key, value));
    }

    IssuePayload {
        project_key: project_key.to_string(),
        fields,
    }
}

/// `"High"` becomes `{"name": "High"}`; objects pass through.
fn named(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(json!({ "name": s })),
        Value::Object(o) if !o.is_empty() => Some(Value::Object(o.clone())),
        _ => None,
    }
}

fn shape_optional(key: &str, value: &Value) -> Value {
    match (key, value) {
        ("components", Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => json!({ "name": s }),
                    other => other.clone(),
                })
                .collect(),
        ),
        ("assignee" | "reporter", Value::String(s)) => json!({ "accountId": s }),
        _ => value.clone(),
    }
}
