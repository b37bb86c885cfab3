use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::header::COOKIE;
use http::request::Parts;
use session::cookie::extract_auth_token_cookie;

/// The raw auth token from the request's `auth_token` cookie.
///
/// Never rejects: handlers own their unauthenticated behavior, so a
/// missing or unreadable cookie extracts as `None`.
pub(crate) struct AuthToken(pub Option<String>);

impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(COOKIE)
            .and_then(extract_auth_token_cookie);
        Ok(Self(token))
    }
}
