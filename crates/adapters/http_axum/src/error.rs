//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use herald_domain::error::{HeraldError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`HeraldError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(HeraldError);

impl ApiError {
    /// A path or query identifier that does not parse.
    pub fn invalid_id(raw: &str) -> Self {
        Self(ValidationError::InvalidIdentifier(raw.to_string()).into())
    }
}

impl From<HeraldError> for ApiError {
    fn from(err: HeraldError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            HeraldError::Validation(err) => (StatusCode::BAD_REQUEST, describe(err)),
            HeraldError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            HeraldError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn describe(err: &ValidationError) -> String {
    match err {
        ValidationError::InvalidCondition(inner) => format!("{err}: {inner}"),
        _ => err.to_string(),
    }
}
