// SPDX-License-Identifier: Apache-2.0

//! HTTP server exposing the bugcap issue suggestion pipeline.
//!
//! Routes:
//! - `POST /api/analyze-logs` - runs the pipeline; the body is always the
//!   response envelope, the status reflects its error kind
//! - `GET /health` - reports which credentials are configured
//!
//! Clients are built once at startup and shared by every request.

mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bugcap_core::{
    AiProvider, AppConfig, BugcapError, CredentialProvider, ErrorKind, IssueTracker,
    PipelineConfig, PipelineRequest, PipelineResponse, SuggestionPipeline, TaskType,
    build_ai_client, build_jira_client,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub use health::{CredentialStatus, HealthCheckResponse};

/// Tracker and model clients shared across requests.
pub struct StageClients {
    /// Tracker client.
    pub tracker: Arc<dyn IssueTracker>,
    /// Stage 1 client.
    pub analyzer: Arc<dyn AiProvider>,
    /// Stage 2 client.
    pub suggester: Arc<dyn AiProvider>,
}

/// Shared server state.
pub struct AppState {
    clients: Result<StageClients, BugcapError>,
    pipeline: PipelineConfig,
    health: HealthCheckResponse,
}

impl AppState {
    /// State over already-built clients.
    #[must_use]
    pub fn new(clients: StageClients, pipeline: PipelineConfig) -> Self {
        Self {
            clients: Ok(clients),
            pipeline,
            health: HealthCheckResponse {
                jira: CredentialStatus::Valid,
                ai: CredentialStatus::Valid,
            },
        }
    }

    /// State for a server whose clients could not be built.
    ///
    /// Every pipeline request answers with `err` as a configuration error.
    #[must_use]
    pub fn unconfigured(err: BugcapError, health: HealthCheckResponse) -> Self {
        Self {
            clients: Err(err),
            pipeline: PipelineConfig::default(),
            health,
        }
    }

    /// Builds clients from configuration and credentials.
    ///
    /// A missing credential does not stop the server; it is reported by
    /// `/health` and by every pipeline request.
    pub fn from_config(credentials: &dyn CredentialProvider, config: &AppConfig) -> Self {
        let health = HealthCheckResponse::check(credentials, config);
        match build_clients(credentials, config) {
            Ok(clients) => Self {
                clients: Ok(clients),
                pipeline: config.pipeline.clone(),
                health,
            },
            Err(e) => {
                warn!(error = %e, "Pipeline clients unavailable");
                Self::unconfigured(e, health)
            }
        }
    }

    /// Whether pipeline requests can be served.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.clients.is_ok()
    }
}

fn build_clients(
    credentials: &dyn CredentialProvider,
    config: &AppConfig,
) -> bugcap_core::Result<StageClients> {
    Ok(StageClients {
        tracker: Arc::new(build_jira_client(credentials, &config.jira)?),
        analyzer: Arc::new(build_ai_client(credentials, &config.ai, TaskType::Analyze)?),
        suggester: Arc::new(build_ai_client(credentials, &config.ai, TaskType::Suggest)?),
    })
}

/// HTTP status for a pipeline outcome.
fn status_for(kind: Option<ErrorKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::Configuration) => StatusCode::INTERNAL_SERVER_ERROR,
        Some(ErrorKind::UpstreamCallFailed | ErrorKind::LogAnalysisFailed) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

async fn analyze_logs(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PipelineRequest>, JsonRejection>,
) -> (StatusCode, Json<PipelineResponse>) {
    let response = match (&state.clients, body) {
        (_, Err(rejection)) => PipelineResponse::from_error(&BugcapError::InvalidInput {
            message: rejection.body_text(),
        }),
        (Err(e), Ok(_)) => PipelineResponse::from_error(e),
        (Ok(clients), Ok(Json(request))) => {
            SuggestionPipeline::with_stage_providers(
                clients.tracker.as_ref(),
                clients.analyzer.as_ref(),
                clients.suggester.as_ref(),
                state.pipeline.clone(),
            )
            .run(&request)
            .await
        }
    };
    (status_for(response.error_kind()), Json(response))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthCheckResponse> {
    Json(state.health)
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analyze-logs", post(analyze_logs))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server.
///
/// Binds `host:port` and serves [`router`]. Gracefully shuts down on Ctrl+C.
pub async fn run_http(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    // Handle both IPv4 and IPv6 addresses
    let addr: SocketAddr = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
    .parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {e}");
                return;
            }
            info!("Received Ctrl+C, shutting down gracefully");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(None), StatusCode::OK);
        assert_eq!(status_for(Some(ErrorKind::InvalidInput)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(Some(ErrorKind::NotFound)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(Some(ErrorKind::Configuration)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(Some(ErrorKind::LogAnalysisFailed)),
            StatusCode::BAD_GATEWAY
        );
    }
}
