//! Veris API Gateway
//!
//! REST surface over the verification orchestration engine:
//! - POST /api/v1/verifications — run one verification end to end
//! - GET  /api/v1/verifications/:identity_id/audit — audit trail for a run
//! - GET  /health — service metadata

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use veris_common::{VerificationInput, VerificationOutcome};
use veris_engine::{
    EngineConfig, HttpProvider, InMemoryAuditLog, Notification, Orchestrator, ENGINE_VERSION,
};

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
    audit: Arc<InMemoryAuditLog>,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct VerificationResponse {
    notification: Notification,
    outcome: VerificationOutcome,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: ENGINE_VERSION,
        started_at: state.started_at,
    })
}

async fn run_verification(
    State(state): State<AppState>,
    Json(input): Json<VerificationInput>,
) -> Json<VerificationResponse> {
    let report = state.orchestrator.run(input).await;
    Json(VerificationResponse {
        notification: report.notification,
        outcome: report.outcome,
    })
}

async fn get_audit_trail(
    State(state): State<AppState>,
    Path(identity_id): Path<String>,
) -> impl IntoResponse {
    let events = state.audit.events_for(&identity_id);
    match state.audit.record_for(&identity_id) {
        Some(record) => Json(serde_json::json!({
            "record": record,
            "events": events,
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": "unknown identity" })),
        )
            .into_response(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_gateway=info".parse()?),
        )
        .json()
        .init();

    dotenvy::dotenv().ok();

    let config = EngineConfig::load()?;
    info!(provider_url = %config.provider.base_url, "loaded engine configuration");

    let provider = Arc::new(HttpProvider::new(&config.provider)?);
    let audit = Arc::new(InMemoryAuditLog::new());
    let orchestrator = Arc::new(Orchestrator::from_config(provider, audit.clone(), &config));

    let state = AppState {
        orchestrator,
        audit,
        started_at: Utc::now(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/verifications", post(run_verification))
        .route(
            "/api/v1/verifications/:identity_id/audit",
            get(get_audit_trail),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("0.0.0.0:{}", port);
    info!("Veris API Gateway starting on {}", addr);
    info!("Endpoints: /health, /api/v1/verifications");

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal");
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
