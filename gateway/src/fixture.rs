//! Shared fixtures for handler tests.

use std::sync::Arc;

use axum::response::Response;
use backend::test_utils::MockBackendClient;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::server::Handler;

/// A handler wired to a scripted backend and local-dev config.
pub(crate) fn test_handler(mock: Arc<MockBackendClient>) -> Handler {
    Handler::new(
        mock,
        GatewayConfig {
            backend_api_url: String::from("http://backend.test/api"),
            port: 0,
            secure_cookies: false,
        },
    )
}

/// Collects a response body as JSON.
pub(crate) async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Collects a response body as text.
pub(crate) async fn response_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
