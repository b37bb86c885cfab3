//! Login, registration and logout.
//!
//! Credentials are relayed to the backend, which issues the token. The
//! gateway stores it in the auth cookie and decides the post-login
//! redirect from the token's normalized role.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_macros::debug_handler;
use backend::{ForwardRequest, ForwardedResponse};
use http::header::LOCATION;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use session::Role;
use session::cookie::{
    AUTH_TOKEN_COOKIE_KEY, ResponseCookies, create_auth_token_cookie, expire_auth_token_cookie,
    extract_cookie_value,
};
use session::routing::{Destination, decide_destination};
use session::{claims, token};
use tracing::instrument;

use crate::error::ApiError;
use crate::server::Handler;
use crate::utils::json_field;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct RegisterForm {
    nom: String,
    prenom: String,
    email: String,
    telephone: String,
    password: String,
    role: String,
}

/// Outcome of a login attempt.
///
/// The redirect is an intentional control transfer, not a failure, so it
/// is a variant here rather than an error a wrapper could swallow.
#[derive(Debug)]
pub(crate) enum LoginOutcome {
    Redirect {
        destination: Destination,
        token: String,
    },
    Rejected {
        status: StatusCode,
        message: String,
    },
}

/// Logs a user in against the backend, stores the issued token in the
/// auth cookie and redirects by role.
#[debug_handler]
#[instrument(skip(h, form), err)]
pub(crate) async fn login(
    State(h): State<Handler>,
    Json(form): Json<LoginForm>,
) -> Result<Response, ApiError> {
    match authenticate(&h, form).await {
        LoginOutcome::Redirect { destination, token } => Ok(Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(LOCATION, destination.path())
            .with_cookie(create_auth_token_cookie(token, h.config.secure_cookies))
            .body(Body::empty())?),
        LoginOutcome::Rejected { status, message } => Ok(rejection(status, &message)),
    }
}

/// Runs the credential relay and the destination decision.
pub(crate) async fn authenticate(h: &Handler, form: LoginForm) -> LoginOutcome {
    let body = json!({ "email": form.email, "password": form.password }).to_string();
    let req = ForwardRequest::new(Method::POST, "/auth/login").with_body(body);

    let reply = match h.backend.forward(req).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!("login relay failed: {err}");
            return LoginOutcome::Rejected {
                status: StatusCode::BAD_GATEWAY,
                message: String::from("Erreur de connexion"),
            };
        }
    };

    if !reply.is_ok() {
        return LoginOutcome::Rejected {
            status: reply.status,
            message: json_field(&reply.body, "message")
                .unwrap_or_else(|| String::from("Échec de la connexion")),
        };
    }

    let Some(token) = issued_token(&reply) else {
        return LoginOutcome::Rejected {
            status: StatusCode::BAD_GATEWAY,
            message: String::from(
                "Token manquant. Vérifiez vos identifiants ou la config du backend.",
            ),
        };
    };

    let claims = token::decode(&token);
    let role = claims
        .as_ref()
        .and_then(claims::extract_role)
        .unwrap_or(Role::User);
    let destination = decide_destination(role, claims.as_ref(), &token, h.backend.as_ref()).await;

    LoginOutcome::Redirect { destination, token }
}

/// The issued token: the backend's `Set-Cookie` wins, then a `token`
/// field in the JSON body.
fn issued_token(reply: &ForwardedResponse) -> Option<String> {
    reply
        .set_cookie
        .iter()
        .find_map(|value| extract_cookie_value(AUTH_TOKEN_COOKIE_KEY, value))
        .or_else(|| json_field(&reply.body, "token"))
}

/// Registers a new account and sends the user to the login page.
#[debug_handler]
#[instrument(skip(h, form), err)]
pub(crate) async fn register(
    State(h): State<Handler>,
    Json(form): Json<RegisterForm>,
) -> Result<Response, ApiError> {
    let req = ForwardRequest::new(Method::POST, "/auth/register")
        .with_body(serde_json::to_string(&form)?);

    let reply = match h.backend.forward(req).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!("register relay failed: {err}");
            return Ok(rejection(
                StatusCode::BAD_GATEWAY,
                "Une erreur est survenue lors de l'inscription. Veuillez réessayer.",
            ));
        }
    };

    if reply.is_ok() {
        return Ok(Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(LOCATION, "/login")
            .body(Body::empty())?);
    }

    let message = json_field(&reply.body, "message")
        .unwrap_or_else(|| String::from("Erreur lors de l'inscription."));
    Ok(rejection(reply.status, &message))
}

/// Clears the auth cookie and sends the user back to the login page.
#[debug_handler]
#[instrument]
pub(crate) async fn logout() -> Result<Response, ApiError> {
    Ok(Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(LOCATION, "/login")
        .with_cookie(expire_auth_token_cookie())
        .body(Body::empty())?)
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}
