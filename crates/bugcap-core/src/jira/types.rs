// SPDX-License-Identifier: Apache-2.0

//! Jira field-schema types and the wire shapes they are decoded from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One attribute of an issue type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field key used in create payloads (e.g. `summary`, `customfield_10020`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the tracker rejects creates without it.
    pub required: bool,
    /// Tracker schema type (`string`, `array`, `priority`, ...).
    pub value_type: String,
    /// Element type for array fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,
    /// Allowed values, when the tracker enumerates them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

/// Field schema for one issue type of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTypeSchema {
    /// Issue type id.
    pub id: String,
    /// Issue type name (e.g. "Bug").
    pub name: String,
    /// Issue type description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this is a sub-task type.
    pub is_subtask: bool,
    /// Fields the tracker requires.
    pub required_fields: Vec<Field>,
    /// Fields the tracker accepts but does not require.
    pub optional_fields: Vec<Field>,
}

impl IssueTypeSchema {
    /// All fields, required first.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.required_fields.iter().chain(&self.optional_fields)
    }

    /// Whether a field with this key exists.
    #[must_use]
    pub fn has_field(&self, id: &str) -> bool {
        self.fields().any(|f| f.id == id)
    }
}

/// Identity of a Jira project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Project id.
    pub id: String,
    /// Project key (e.g. "PMT").
    pub key: String,
    /// Project name.
    pub name: String,
}

/// Output of the field schema fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSchema {
    /// Project identity.
    pub project: ProjectInfo,
    /// Issue types with their field schemas.
    pub issue_types: Vec<IssueTypeSchema>,
}

impl ProjectSchema {
    /// Finds an issue type by name, case-insensitively.
    #[must_use]
    pub fn issue_type(&self, name: &str) -> Option<&IssueTypeSchema> {
        self.issue_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Names of all issue types, in tracker order.
    #[must_use]
    pub fn issue_type_names(&self) -> Vec<String> {
        self.issue_types.iter().map(|t| t.name.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `GET /rest/api/3/project/{key}` response (subset).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    /// Project id.
    pub id: String,
    /// Project key.
    pub key: String,
    /// Project name.
    pub name: String,
    /// Issue types enabled for the project.
    #[serde(default)]
    pub issue_types: Vec<IssueTypeRef>,
}

/// Issue type as listed on a project.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTypeRef {
    /// Issue type id.
    pub id: String,
    /// Issue type name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Sub-task flag.
    #[serde(default)]
    pub subtask: bool,
}

/// `GET /rest/api/3/issue/createmeta` response (subset).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMetaResponse {
    /// Matching projects.
    #[serde(default)]
    pub projects: Vec<CreateMetaProject>,
}

/// Project entry in createmeta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMetaProject {
    /// Issue types with expanded fields.
    #[serde(default)]
    pub issuetypes: Vec<CreateMetaIssueType>,
}

/// Issue type entry in createmeta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMetaIssueType {
    /// Issue type name.
    #[serde(default)]
    pub name: String,
    /// Field definitions keyed by field id.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldMeta>,
}

/// One field definition in createmeta.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    /// Whether the field is required.
    #[serde(default)]
    pub required: bool,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Type information.
    #[serde(default)]
    pub schema: FieldSchemaMeta,
    /// Enumerated values.
    #[serde(default)]
    pub allowed_values: Option<Vec<Value>>,
}

/// `schema` block of a field definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSchemaMeta {
    /// Value type.
    #[serde(rename = "type", default)]
    pub value_type: String,
    /// Array element type.
    #[serde(default)]
    pub items: Option<String>,
}

impl CreateMetaResponse {
    /// Flattens the first matching issue type's fields into [`Field`]s.
    #[must_use]
    pub fn into_fields(self) -> Vec<Field> {
        self.projects
            .into_iter()
            .flat_map(|p| p.issuetypes)
            .next()
            .map(|issue_type| {
                issue_type
                    .fields
                    .into_iter()
                    .map(|(id, meta)| Field {
                        name: if meta.name.is_empty() {
                            id.clone()
                        } else {
                            meta.name
                        },
                        id,
                        required: meta.required,
                        value_type: meta.schema.value_type,
                        items: meta.schema.items,
                        allowed_values: meta.allowed_values,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
