// SPDX-License-Identifier: Apache-2.0

//! Prompt text for the two model stages.

use serde_json::json;

use crate::jira::{IssueTypeSchema, ProjectInfo};
use crate::suggestion::{LogAnalysis, LogContext};

/// System prompt for Stage 1.
pub const LOG_ANALYZER_SYSTEM_PROMPT: &str = r#"You are a senior QA engineer who turns raw browser console logs into bug reports.

Read the logs and the capture context, identify the failure that matters most to the user, and describe it.

Your response MUST be valid JSON with this exact schema:
{
  "ticketTitle": "Short, specific issue title (max 100 characters)",
  "summaryMarkdown": "Markdown summary with sections: ## Summary, ## Errors Observed, ## Likely Cause, ## Steps to Reproduce"
}

Guidelines:
- ticketTitle: name the broken feature and the symptom, not the stack frame.
- summaryMarkdown: quote the key error lines verbatim in code blocks. Mention HTTP status codes, failing URLs and timestamps when present.
- If the logs show no error, say so plainly instead of inventing one.
- Do not include any text outside the JSON object."#;

/// System prompt for Stage 2.
pub const FIELD_VALUE_EXPERT_SYSTEM_PROMPT: &str = r#"You are a Jira field value expert. Given console logs, an analysis of those logs and the create-issue field schema of a project, propose a value for each field.

Rules:
- Only use field keys that appear in the provided schema, plus summary, description, issuetype and priority.
- Respect each field's type and, when allowedValues are listed, pick one of them.
- Treat severity signals in the logs when choosing priority: HTTP 500 errors, crashes and timeouts suggest High or Highest; HTTP 404 errors and failed assets suggest Medium; warnings only suggest Low.
- For fields that do not apply, use null for single values and an empty array for collections.
- Give a confidence between 0 and 1 and a one-sentence reasoning for every field you fill.

Your response MUST be valid JSON with this exact schema:
{
  "fieldValues": {
    "summary": "Issue title",
    "description": "Markdown description",
    "issuetype": {"name": "Bug"},
    "priority": {"name": "High"},
    "labels": ["label1"]
  },
  "confidence": {"summary": 0.9},
  "reasoning": {"summary": "Why this value was chosen"}
}

Do not include any text outside the JSON object."#;

/// Builds the Stage 1 user message.
#[must_use]
pub fn build_analyze_user_prompt(logs: &str, context: &LogContext) -> String {
    let context_json =
        serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string());

    format!(
        "<capture_context>\n{context_json}\n</capture_context>\n\n<console_logs>\n{logs}\n</console_logs>"
    )
}

/// Builds the Stage 2 user message.
#[must_use]
pub fn build_suggest_user_prompt(
    logs: &str,
    analysis: &LogAnalysis,
    issue_type: &IssueTypeSchema,
    project: &ProjectInfo,
    available_issue_types: &[&str],
) -> String {
    let project_json = json!({
        "name": project.name,
        "key": project.key,
        "availableIssueTypes": available_issue_types,
    });
    let schema_json = json!({
        "issueType": issue_type.name,
        "requiredFields": issue_type.required_fields,
        "optionalFields": issue_type.optional_fields,
    });
    let analysis_json = serde_json::to_string_pretty(analysis).unwrap_or_default();
    let schema_json = serde_json::to_string_pretty(&schema_json).unwrap_or_default();

    format!(
        "<project>\n{project_json}\n</project>\n\n\
         <log_analysis>\n{analysis_json}\n</log_analysis>\n\n\
         <field_schema>\n{schema_json}\n</field_schema>\n\n\
         <console_logs>\n{logs}\n</console_logs>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::Field;

    #[test]
    fn test_system_prompts_name_output_keys() {
        assert!(LOG_ANALYZER_SYSTEM_PROMPT.contains("ticketTitle"));
        assert!(LOG_ANALYZER_SYSTEM_PROMPT.contains("summaryMarkdown"));
        assert!(FIELD_VALUE_EXPERT_SYSTEM_PROMPT.contains("fieldValues"));
        assert!(FIELD_VALUE_EXPERT_SYSTEM_PROMPT.contains("confidence"));
        assert!(FIELD_VALUE_EXPERT_SYSTEM_PROMPT.contains("reasoning"));
        assert!(FIELD_VALUE_EXPERT_SYSTEM_PROMPT.contains("404"));
    }

    #[test]
    fn test_analyze_prompt_embeds_logs_and_context() {
        let context = LogContext {
            source: Some("browser-console".to_string()),
            ..LogContext::default()
        };
        let prompt = build_analyze_user_prompt("TypeError: x is undefined", &context);
        assert!(prompt.contains("TypeError: x is undefined"));
        assert!(prompt.contains("\"source\": \"browser-console\""));
        assert!(prompt.ends_with("</console_logs>"));
    }

    #[test]
    fn test_suggest_prompt_embeds_schema_and_project() {
        let issue_type = IssueTypeSchema {
            id: "1".to_string(),
            name: "Bug".to_string(),
            description: None,
            is_subtask: false,
            required_fields: vec![Field {
                id: "summary".to_string(),
                name: "Summary".to_string(),
                required: true,
                value_type: "string".to_string(),
                items: None,
                allowed_values: None,
            }],
            optional_fields: vec![],
        };
        let project = ProjectInfo {
            id: "10000".to_string(),
            key: "PMT".to_string(),
            name: "Payments".to_string(),
        };
        let analysis = LogAnalysis {
            ticket_title: "Checkout crash".to_string(),
            summary_markdown: "## Summary".to_string(),
        };

        let prompt = build_suggest_user_prompt(
            "logs here",
            &analysis,
            &issue_type,
            &project,
            &["Bug", "Task"],
        );
        assert!(prompt.contains("\"key\":\"PMT\""));
        assert!(prompt.contains("availableIssueTypes"));
        assert!(prompt.contains("\"requiredFields\""));
        assert!(prompt.contains("Checkout crash"));
        assert!(prompt.contains("logs here"));
    }
}
