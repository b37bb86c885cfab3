//! The who-am-I endpoint.
//!
//! Answers entirely from the token claims, no backend round trip. A
//! missing or undecodable token reads as unauthenticated.

use axum::Json;
use axum::response::{IntoResponse, Response};
use axum_macros::debug_handler;
use http::StatusCode;
use serde::Serialize;
use serde_json::json;
use session::{Role, claims, token};
use tracing::instrument;

use crate::extract::AuthToken;

/// Identity payload derived locally from the token claims.
#[derive(Debug, Serialize)]
pub(crate) struct MeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    email: String,
    nom: String,
    prenom: String,
    role: &'static str,
}

#[debug_handler]
#[instrument(skip(token))]
pub(crate) async fn me(AuthToken(token): AuthToken) -> Response {
    let Some(token) = token else {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "no token"}))).into_response();
    };
    let Some(claims) = token::decode(&token) else {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad token"}))).into_response();
    };

    Json(MeResponse {
        id: claims::extract_id(&claims),
        email: claims::extract_email(&claims).unwrap_or_default(),
        nom: claims::extract_last_name(&claims).unwrap_or_default(),
        prenom: claims::extract_first_name(&claims).unwrap_or_default(),
        role: claims::extract_role(&claims).unwrap_or(Role::User).as_str(),
    })
    .into_response()
}
