pub mod clustering;
pub mod dataset;
pub mod health;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::EngineError;

/// Engine error projected onto the wire: `{status: "error", message}` with
/// 400 for argument/precondition failures and 500 for invariant violations.
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::InvalidArgument(_) | EngineError::PreconditionFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::InternalInvariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "status": "error",
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
