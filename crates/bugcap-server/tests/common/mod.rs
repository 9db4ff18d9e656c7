// SPDX-License-Identifier: Apache-2.0

//! In-process fakes for router tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use bugcap_core::ai::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, Usage,
};
use bugcap_core::jira::types::{IssueTypeRef, ProjectResponse};
use bugcap_core::{AiProvider, BugcapError, Field, IssueTracker, PipelineConfig};
use bugcap_server::{AppState, StageClients, router};
use reqwest::Client;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

/// Tracker with a single project `PMT` offering Bug and Task.
pub struct FakeJira;

#[async_trait]
impl IssueTracker for FakeJira {
    async fn get_project(&self, project_key: &str) -> bugcap_core::Result<ProjectResponse> {
        if project_key != "PMT" {
            return Err(BugcapError::NotFound {
                resource: "Project".to_string(),
                message: format!("no project '{project_key}'"),
            });
        }
        Ok(ProjectResponse {
            id: "10000".to_string(),
            key: "PMT".to_string(),
            name: "Payments".to_string(),
            issue_types: ["Bug", "Task"]
                .iter()
                .enumerate()
                .map(|(i, name)| IssueTypeRef {
                    id: (10_001 + i).to_string(),
                    name: (*name).to_string(),
                    description: None,
                    subtask: false,
                })
                .collect(),
        })
    }

    async fn get_create_fields(
        &self,
        _project_key: &str,
        _issue_type_name: &str,
    ) -> bugcap_core::Result<Vec<Field>> {
        Ok(["summary", "description", "priority", "labels"]
            .iter()
            .map(|id| Field {
                id: (*id).to_string(),
                name: id.to_uppercase(),
                required: *id == "summary",
                value_type: if *id == "labels" { "array" } else { "string" }.to_string(),
                items: None,
                allowed_values: None,
            })
            .collect())
    }
}

/// Replays canned completion texts; `Err` entries fail the HTTP call.
pub struct ScriptedAi {
    http: Client,
    api_key: SecretString,
    script: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedAi {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            http: Client::new(),
            api_key: SecretString::from("sk-test"),
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl AiProvider for ScriptedAi {
    fn name(&self) -> &str {
        "scripted"
    }

    fn api_url(&self) -> &str {
        "http://localhost/v1/chat/completions"
    }

    fn api_key_env(&self) -> &str {
        "SCRIPTED_API_KEY"
    }

    fn http_client(&self) -> &Client {
        &self.http
    }

    fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn max_tokens(&self) -> u32 {
        2000
    }

    fn temperature(&self) -> f32 {
        0.3
    }

    async fn send_request_inner(
        &self,
        _request: &ChatCompletionRequest,
    ) -> anyhow::Result<ChatCompletionResponse> {
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));
        let content = next.map_err(|message| BugcapError::Upstream {
            service: "scripted".to_string(),
            message,
            status: Some(400),
        })?;
        Ok(ChatCompletionResponse {
            choices: vec![Choice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content,
                },
            }],
            usage: Some(Usage {
                prompt_tokens: 500,
                completion_tokens: 100,
            }),
        })
    }
}

pub const STAGE1_REPLY: &str = r#"```json
{"ticketTitle": "Checkout total crashes on empty cart", "summaryMarkdown": "**Error:** TypeError in cart.js"}
```"#;

pub const STAGE2_REPLY: &str = r#"Here you go:
{"fieldValues": {"summary": "Checkout total crashes on empty cart", "description": "TypeError in cart.js", "priority": {"name": "High"}, "labels": ["checkout"]}, "confidence": {"summary": 0.9}, "reasoning": {"priority": "Blocks checkout"}}"#;

/// Router over the fakes, with one AI script shared by both stages.
pub fn app(script: Vec<Result<String, String>>) -> Router {
    let ai: Arc<dyn AiProvider> = Arc::new(ScriptedAi::new(script));
    let clients = StageClients {
        tracker: Arc::new(FakeJira),
        analyzer: Arc::clone(&ai),
        suggester: ai,
    };
    router(Arc::new(AppState::new(clients, PipelineConfig::default())))
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (u16, Value) {
    let response: Response<Body> = app.oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
