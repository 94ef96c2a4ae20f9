use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::state::AppState;
use crate::domain::Point;
use crate::error::EngineError;
use crate::handler::ApiError;

#[derive(Deserialize, Debug)]
pub struct GenerateRequest {
    pub num_points: i64,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub dataset: Vec<Point>,
}

/// Handler for POST /v1/dataset: generate a fresh dataset, replacing the
/// previous one and wiping any clustering state.
pub async fn generate_dataset_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let num_points = usize::try_from(request.num_points)
        .map_err(|_| EngineError::InvalidArgument("num_points must be positive".into()))?;

    let mut session = state.session.lock();
    let dataset = session.generate(num_points)?.to_vec();
    info!(num_points = dataset.len(), "Generated new dataset");

    Ok(Json(GenerateResponse { dataset }))
}
