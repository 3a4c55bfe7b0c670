use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::OptimizeError;
use crate::optimizer::validate::validate_request;
use crate::optimizer::{build_optimizer, Optimizer, SelectionResult, Strategy};

#[derive(Clone)]
struct ApiState {
    local: Arc<dyn Optimizer>,
    remote: Option<Arc<dyn Optimizer>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<OptimizeError> for ApiError {
    fn from(err: OptimizeError) -> Self {
        if err.is_client_error() {
            debug!("rejected optimization request: {err}");
            return Self {
                status: StatusCode::BAD_REQUEST,
                message: err.public_message(),
            };
        }
        error!("optimization failed: {err}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.public_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub fn router(config: &Config) -> Result<Router> {
    let remote = if config.remote_configured() {
        Some(build_optimizer(Strategy::Remote, &config.remote)?)
    } else {
        warn!("remote.base_url is not set; forecast optimization is unavailable");
        None
    };
    let state = ApiState {
        local: build_optimizer(Strategy::Local, &config.remote)?,
        remote,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/api/optimize-kols", post(optimize_local))
        .route("/api/optimize-kols/forecast", post(optimize_forecast))
        .layer(cors)
        .with_state(state))
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let app = router(&config)?;
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("KOL optimizer API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn optimize_local(
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<SelectionResult> {
    run_optimizer(Some(state.local.as_ref()), &body).await
}

async fn optimize_forecast(
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<SelectionResult> {
    run_optimizer(state.remote.as_deref(), &body).await
}

// Validation runs before the optimizer is resolved.
async fn run_optimizer(
    optimizer: Option<&dyn Optimizer>,
    body: &[u8],
) -> ApiResult<SelectionResult> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|_| OptimizeError::invalid("request body must be valid JSON"))?;
    let request = validate_request(&payload)?;
    let optimizer = optimizer.ok_or_else(|| {
        OptimizeError::Configuration("remote.base_url is not set".to_string())
    })?;
    debug!(
        strategy = optimizer.strategy().as_slug(),
        candidates = request.candidates.len(),
        budget = request.budget.value(),
        "optimizing candidate set"
    );
    let result = optimizer
        .optimize(&request.candidates, request.budget)
        .await?;
    Ok(Json(result))
}
