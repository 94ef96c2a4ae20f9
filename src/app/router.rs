use axum::Router;
use axum::routing::{get, post};

use crate::app::state::AppState;
use crate::handler::clustering::{reset_handler, run_handler, start_handler, step_handler};
use crate::handler::dataset::generate_dataset_handler;
use crate::handler::health::health_handler;

/// Build the HTTP router (health + clustering API).
pub fn api_router(state: AppState) -> Router {
    let v1_health_router = Router::new().route("/v1/health", get(health_handler));

    let v1_api_router = Router::new()
        .route("/v1/dataset", post(generate_dataset_handler))
        .route("/v1/start", post(start_handler))
        .route("/v1/step", post(step_handler))
        .route("/v1/run", post(run_handler))
        .route("/v1/reset", post(reset_handler))
        .with_state(state);

    Router::new().merge(v1_health_router).merge(v1_api_router)
}
