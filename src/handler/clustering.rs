use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::app::state::AppState;
use crate::domain::{InitMethod, Point, StepOutcome, StepStatus};
use crate::handler::ApiError;

#[derive(Deserialize, Debug)]
pub struct StartRequest {
    pub k: i64,
    pub init_method: InitMethod,
    #[serde(default)]
    pub manual_centroids: Option<Vec<Point>>,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub status: &'static str,
    pub centroids: Vec<Point>,
    pub clusters: Vec<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct StepRequest {
    pub k: i64,
    /// Carried by the original wire format; initialization happens in
    /// `start`, so stepping only validates `k`.
    #[serde(default)]
    pub init_method: Option<InitMethod>,
}

#[derive(Deserialize, Debug)]
pub struct RunRequest {
    pub k: i64,
}

#[derive(Serialize)]
pub struct StepResponse {
    pub status: StepStatus,
    pub centroids: Vec<Point>,
    pub clusters: Vec<Vec<Point>>,
    pub iteration: u32,
}

fn validate_k(k: i64) -> Result<usize, ApiError> {
    usize::try_from(k)
        .ok()
        .filter(|&k| k > 0)
        .ok_or_else(|| crate::error::EngineError::InvalidArgument("k must be at least 1".into()).into())
}

/// Handler for POST /v1/start: initialize centroids for a new run.
pub async fn start_handler(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let k = validate_k(request.k)?;

    let mut session = state.session.lock();
    let message = session.initialize(k, request.init_method, request.manual_centroids)?;
    info!(k, method = ?request.init_method, "Initialized clustering run");

    Ok(Json(StartResponse {
        status: "ok",
        centroids: session.centroids().to_vec(),
        clusters: session.preview_clusters(),
        message,
    }))
}

/// Handler for POST /v1/step: advance the run by exactly one iteration.
pub async fn step_handler(
    State(state): State<AppState>,
    Json(request): Json<StepRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    let k = validate_k(request.k)?;

    let mut session = state.session.lock();
    let outcome = session.step(k)?;
    info!(
        iteration = outcome.iteration,
        status = ?outcome.status,
        "Completed k-means step"
    );

    Ok(Json(step_response(&session, outcome)))
}

/// Handler for POST /v1/run: drive the same step loop to convergence
/// server-side and return the final state.
pub async fn run_handler(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    let k = validate_k(request.k)?;

    let mut session = state.session.lock();
    let outcome = session.run_to_convergence(k)?;
    info!(iteration = outcome.iteration, "Run reached convergence");

    Ok(Json(step_response(&session, outcome)))
}

/// Handler for POST /v1/reset: wipe the clustering run, keep the dataset.
pub async fn reset_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let mut session = state.session.lock();
    let dataset = session.reset()?.to_vec();
    info!("Session reset; dataset kept");

    Ok(Json(json!({
        "status": "reset",
        "dataset": dataset,
    })))
}

fn step_response(session: &crate::domain::Session, outcome: StepOutcome) -> StepResponse {
    StepResponse {
        status: outcome.status,
        centroids: session.centroids().to_vec(),
        clusters: session.clusters(),
        iteration: outcome.iteration,
    }
}
