//! HTTP API gateway for KubeSentinel.
//!
//! Exposes the analysis pipeline over REST and SSE. Everything in this crate
//! is simulation-only glue around the core interpreter: the execute endpoint
//! sleeps and returns canned text, no real cluster is touched.
//!
//! Endpoints:
//! - `GET  /`                    — service info
//! - `GET  /api/health`          — API + Ollama liveness
//! - `POST /api/analyze`         — analyze logs, full response
//! - `POST /api/analyze/stream`  — analyze logs, SSE event stream
//! - `POST /api/execute`         — execute a remediation action (simulated)
//!
//! Built on Axum; CORS origins and bind address come from config.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use kubesentinel_analysis::Analyzer;
use kubesentinel_config::AppConfig;
use kubesentinel_core::log::LogRecord;
use kubesentinel_core::proposal::Proposal;
use kubesentinel_core::transport::LlmTransport;
use kubesentinel_providers::OllamaTransport;

/// Simulated execution delay for the demo execute endpoint.
const EXECUTE_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

/// Shared application state for the gateway.
pub struct GatewayState {
    pub transport: Arc<dyn LlmTransport>,
    pub analyzer: Analyzer,
    pub model: String,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    let origins: Vec<axum::http::HeaderValue> = cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/analyze/stream", post(analyze_stream_handler))
        .route("/api/execute", post(execute_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let transport: Arc<dyn LlmTransport> = Arc::new(OllamaTransport::new(
        &config.ollama.host,
        std::time::Duration::from_secs(config.ollama.timeout_secs),
    )?);
    let analyzer = Analyzer::new(transport.clone(), &config.ollama.model);

    let state = Arc::new(GatewayState {
        transport,
        analyzer,
        model: config.ollama.model.clone(),
    });

    let app = build_router(state, &config.cors_origins);

    info!(addr = %addr, model = %config.ollama.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
    health: &'static str,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        name: "KubeSentinel Backend",
        version: env!("CARGO_PKG_VERSION"),
        health: "/api/health",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    ollama_connected: bool,
    model: String,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let connected = state.transport.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        ollama_connected: connected,
        model: state.model.clone(),
    })
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    logs: Vec<LogRecord>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    proposal: Option<Proposal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// `POST /api/analyze` — analyze logs and propose a remediation action.
///
/// When the LLM yields nothing, a deterministic fallback proposal is built
/// from the first ERROR/CRITICAL log so the demo flow always has an action
/// to show.
async fn analyze_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.logs.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "logs must not be empty".into(),
            }),
        ));
    }

    info!(count = payload.logs.len(), "Analyze request");

    match state.analyzer.analyze(&payload.logs).await {
        Some(proposal) => Ok(Json(AnalyzeResponse {
            success: true,
            proposal: Some(proposal),
            error: None,
        })),
        None => Ok(Json(AnalyzeResponse {
            success: true,
            proposal: Some(fallback_proposal(&payload.logs)),
            error: Some("LLM analysis unavailable, using fallback".into()),
        })),
    }
}

/// Deterministic demo fallback: scale the deployment behind the first
/// incident-level log.
fn fallback_proposal(logs: &[LogRecord]) -> Proposal {
    let pod = logs
        .iter()
        .find(|l| l.level.is_incident())
        .map(|l| l.pod.as_str())
        .unwrap_or("payment-service-7d9cf");

    let deployment = pod.rsplit_once('-').map(|(head, _)| head).unwrap_or(pod);

    let mut args = serde_json::Map::new();
    args.insert("namespace".into(), "prod".into());
    args.insert("deployment".into(), deployment.into());
    args.insert("replicas".into(), 5.into());

    Proposal {
        tool_name: "scale_deployment".into(),
        args,
        reason: "Critical error detected. LLM analysis unavailable - using fallback \
                 recommendation to scale deployment for load distribution."
            .into(),
    }
}

/// `POST /api/analyze/stream` — analyze logs, receive an SSE event stream.
///
/// Events are framed as `event: <type>` / `data: <json>`; the terminal
/// `done` or `error` event is always last.
async fn analyze_stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<
    Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>,
    (StatusCode, Json<ErrorResponse>),
> {
    if payload.logs.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "logs must not be empty".into(),
            }),
        ));
    }

    info!(count = payload.logs.len(), "Streaming analyze request");

    let rx = state.analyzer.analyze_stream(&payload.logs).await;

    let stream = ReceiverStream::new(rx).map(|event| {
        let event_type = event.event_type();
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Ok(Sse::new(stream))
}

#[derive(Deserialize)]
struct ExecuteRequest {
    tool_name: String,
    parameters: DeploymentAction,
}

/// Parameters for scaling a deployment — the only action the demo executes.
#[derive(Debug, Serialize, Deserialize)]
struct DeploymentAction {
    namespace: String,
    deployment: String,
    replicas: u32,
}

#[derive(Serialize)]
struct ExecuteResponse {
    status: &'static str,
    message: String,
    details: serde_json::Value,
}

/// `POST /api/execute` — execute a remediation action (simulated).
///
/// Sleeps to mimic cluster latency and returns canned success text. A real
/// implementation would call the Kubernetes API here.
async fn execute_handler(
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.tool_name != "scale_deployment" {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unknown tool: {}", payload.tool_name),
            }),
        ));
    }

    tokio::time::sleep(EXECUTE_DELAY).await;

    let action = &payload.parameters;
    Ok(Json(ExecuteResponse {
        status: "success",
        message: format!(
            "Successfully scaled deployment '{}' in namespace '{}' to {} replicas",
            action.deployment, action.namespace, action.replicas
        ),
        details: serde_json::json!({
            "namespace": action.namespace,
            "deployment": action.deployment,
            "replicas": action.replicas,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
    }))
}
