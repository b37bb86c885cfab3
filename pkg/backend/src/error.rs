use http::StatusCode;
use thiserror::Error;

/// Error for backend requests.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {0}")]
    Status(StatusCode),
}
