use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use backend::BackendError;
use serde_json::json;
use thiserror::Error;

/// Error for api endpoints.
///
/// Backend *status codes* are relayed transparently by the handlers and
/// never end up here; this error covers transport-level failures and
/// response assembly.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("backend request failed: {0}")]
    Backend(#[from] BackendError),

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("parsing body")]
    ParsingBody(#[from] http::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::Backend(e) => (StatusCode::BAD_GATEWAY, Self::Backend(e).to_string()),
            internal => (StatusCode::INTERNAL_SERVER_ERROR, internal.to_string()),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
