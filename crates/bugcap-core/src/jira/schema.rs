// SPDX-License-Identifier: Apache-2.0

//! Field schema fetcher.
//!
//! Lists a project's issue types, then fetches each type's create-screen
//! fields. A failed per-type lookup degrades to empty field lists; a failed
//! project lookup aborts.

use tracing::{debug, instrument, warn};

use super::IssueTracker;
use super::types::{Field, IssueTypeSchema, ProjectInfo, ProjectSchema};
use crate::error::BugcapError;

/// Fetches the issue types of `project_key` and the field schema of each.
///
/// # Errors
///
/// - `InvalidInput` if the key is blank
/// - `NotFound` if the project does not exist or has no issue types
/// - `Upstream` if the project lookup fails
#[instrument(skip(tracker))]
pub async fn fetch_project_schema(
    tracker: &dyn IssueTracker,
    project_key: &str,
) -> crate::Result<ProjectSchema> {
    let project_key = project_key.trim();
    if project_key.is_empty() {
        return Err(BugcapError::InvalidInput {
            message: "project key is required".to_string(),
        });
    }

    let project = tracker.get_project(project_key).await?;
    if project.issue_types.is_empty() {
        return Err(BugcapError::NotFound {
            resource: "Issue type".to_string(),
            message: format!("project '{project_key}' has no issue types"),
        });
    }

    let mut issue_types = Vec::with_capacity(project.issue_types.len());
    for issue_type in project.issue_types {
        let fields = match tracker
            .get_create_fields(&project.key, &issue_type.name)
            .await
        {
            Ok(fields) => fields,
            Err(e) => {
                warn!(
                    issue_type = %issue_type.name,
                    error = %e,
                    "Field schema lookup failed, continuing without fields"
                );
                Vec::new()
            }
        };

        let (required_fields, optional_fields): (Vec<Field>, Vec<Field>) =
            fields.into_iter().partition(|f| f.required);
        debug!(
            issue_type = %issue_type.name,
            required = required_fields.len(),
            optional = optional_fields.len(),
            "Partitioned fields"
        );

        issue_types.push(IssueTypeSchema {
            id: issue_type.id,
            name: issue_type.name,
            description: issue_type.description.filter(|d| !d.is_empty()),
            is_subtask: issue_type.subtask,
            required_fields,
            optional_fields,
        });
    }

    Ok(ProjectSchema {
        project: ProjectInfo {
            id: project.id,
            key: project.key,
            name: project.name,
        },
        issue_types,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::jira::types::{IssueTypeRef, ProjectResponse};

    struct FakeTracker {
        project: Option<ProjectResponse>,
        fields: HashMap<String, Vec<Field>>,
    }

    #[async_trait]
    impl IssueTracker for FakeTracker {
        async fn get_project(&self, project_key: &str) -> crate::Result<ProjectResponse> {
            self.project.clone().ok_or_else(|| BugcapError::NotFound {
                resource: "Project".to_string(),
                message: project_key.to_string(),
            })
        }

        async fn get_create_fields(
            &self,
            _project_key: &str,
            issue_type_name: &str,
        ) -> crate::Result<Vec<Field>> {
            self.fields
                .get(issue_type_name)
                .cloned()
                .ok_or_else(|| BugcapError::upstream("Jira", "HTTP 500"))
        }
    }

    fn field(id: &str, required: bool) -> Field {
        Field {
            id: id.to_string(),
            name: id.to_string(),
            required,
            value_type: "string".to_string(),
            items: None,
            allowed_values: None,
        }
    }

    fn issue_type(id: &str, name: &str) -> IssueTypeRef {
        IssueTypeRef {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(String::new()),
            subtask: false,
        }
    }

    fn project(issue_types: Vec<IssueTypeRef>) -> ProjectResponse {
        ProjectResponse {
            id: "10000".to_string(),
            key: "PMT".to_string(),
            name: "Payments".to_string(),
            issue_types,
        }
    }

    #[tokio::test]
    async fn test_partitions_required_and_optional() {
        let tracker = FakeTracker {
            project: Some(project(vec![issue_type("1", "Bug")])),
            fields: HashMap::from([(
                "Bug".to_string(),
                vec![field("summary", true), field("labels", false)],
            )]),
        };

        let schema = fetch_project_schema(&tracker, "PMT").await.unwrap();
        let bug = &schema.issue_types[0];
        assert_eq!(bug.required_fields.len(), 1);
        assert_eq!(bug.required_fields[0].id, "summary");
        assert_eq!(bug.optional_fields[0].id, "labels");
        assert_eq!(bug.description, None);
    }

    #[tokio::test]
    async fn test_field_lookup_failure_is_isolated() {
        let tracker = FakeTracker {
            project: Some(project(vec![
                issue_type("1", "Bug"),
                issue_type("2", "Story"),
            ])),
            fields: HashMap::from([("Bug".to_string(), vec![field("summary", true)])]),
        };

        let schema = fetch_project_schema(&tracker, "PMT").await.unwrap();
        assert_eq!(schema.issue_types.len(), 2);
        let story = schema.issue_type("Story").unwrap();
        assert!(story.required_fields.is_empty());
        assert!(story.optional_fields.is_empty());
    }

    #[tokio::test]
    async fn test_zero_issue_types_is_not_found() {
        let tracker = FakeTracker {
            project: Some(project(vec![])),
            fields: HashMap::new(),
        };

        let err = fetch_project_schema(&tracker, "PMT").await.unwrap_err();
        assert!(matches!(err, BugcapError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_blank_project_key_rejected() {
        let tracker = FakeTracker {
            project: None,
            fields: HashMap::new(),
        };

        let err = fetch_project_schema(&tracker, "  ").await.unwrap_err();
        assert!(matches!(err, BugcapError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_project_lookup_failure_propagates() {
        let tracker = FakeTracker {
            project: None,
            fields: HashMap::new(),
        };

        let err = fetch_project_schema(&tracker, "NOPE").await.unwrap_err();
        assert!(matches!(err, BugcapError::NotFound { .. }));
    }
}
