// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the health check endpoint.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use bugcap_core::BugcapError;
use bugcap_server::{AppState, CredentialStatus, HealthCheckResponse, router};
use common::{app, send};
use serde_json::json;

fn get_health() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

#[test]
fn credential_status_serializes_as_variant_name() {
    assert_eq!(
        serde_json::to_string(&CredentialStatus::Valid).unwrap(),
        "\"Valid\""
    );
    assert_eq!(
        serde_json::to_string(&CredentialStatus::Missing).unwrap(),
        "\"Missing\""
    );
}

#[tokio::test]
async fn health_all_valid() {
    let (status, body) = send(app(vec![]), get_health()).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"jira": "Valid", "ai": "Valid"}));
}

#[tokio::test]
async fn health_reports_missing_credentials() {
    let state = AppState::unconfigured(
        BugcapError::MissingCredentials {
            service: "openai".to_string(),
            env_var: "OPENAI_API_KEY".to_string(),
        },
        HealthCheckResponse {
            jira: CredentialStatus::Valid,
            ai: CredentialStatus::Missing,
        },
    );

    let (status, body) = send(router(Arc::new(state)), get_health()).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"jira": "Valid", "ai": "Missing"}));
}
