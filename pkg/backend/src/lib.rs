//! HTTP client for the external helpdesk backend.
//!
//! The gateway never owns business data; every API route relays to the
//! backend configured via `BACKEND_API_URL`. This crate wraps that relay
//! behind [`IBackendClient`] so handlers can be tested against a scripted
//! [`test_utils::MockBackendClient`].

mod error;

pub use error::BackendError;

use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{Method, StatusCode};
use serde::Deserialize;
use session::ProfileLookup;
use session::cookie::AUTH_TOKEN_COOKIE_KEY;

/// A request to relay to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub bearer: Option<String>,
    pub cookie: Option<String>,
    pub body: Option<String>,
}

impl ForwardRequest {
    /// Creates a request for the given method and backend path.
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            bearer: None,
            cookie: None,
            body: None,
        }
    }

    /// Attaches a raw query string (without the leading `?`).
    pub fn with_query<Q: Into<String>>(mut self, query: Q) -> Self {
        let query = query.into();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    /// Authenticates the request from a cookie token: `Authorization:
    /// Bearer` plus a reconstructed `auth_token` cookie, the pair the
    /// backend expects.
    pub fn with_token(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self.cookie = Some(format!("{AUTH_TOKEN_COOKIE_KEY}={token}"));
        self
    }

    /// Forwards an inbound `Cookie` header verbatim.
    pub fn with_cookie_header<C: Into<String>>(mut self, cookie: C) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Attaches a JSON body.
    pub fn with_body<B: Into<String>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The backend's reply, relayed status-transparently.
#[derive(Debug, Clone, Default)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
    pub set_cookie: Vec<String>,
}

impl ForwardedResponse {
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }
}

/// Profile payload from `GET {backend}/auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MeProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[async_trait]
pub trait IBackendClient: ProfileLookup + Send + Sync {
    /// Relays a request to the backend and returns its reply.
    async fn forward(&self, req: ForwardRequest) -> Result<ForwardedResponse, BackendError>;

    /// Fetches the canonical profile for a token. Non-2xx replies are
    /// errors; a 2xx reply without an id is a profile with `id: None`.
    async fn fetch_me(&self, token: &str) -> Result<MeProfile, BackendError>;
}

/// Reqwest-backed [`IBackendClient`].
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a new [`BackendClient`] for the given base URL.
    pub fn new<U: Into<String>>(base_url: U) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

#[async_trait]
impl IBackendClient for BackendClient {
    async fn forward(&self, req: ForwardRequest) -> Result<ForwardedResponse, BackendError> {
        let mut request = self
            .http
            .request(req.method, self.url(&req.path, req.query.as_deref()))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(bearer) = &req.bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {bearer}"));
        }
        if let Some(cookie) = &req.cookie {
            request = request.header(COOKIE, cookie.clone());
        }
        if let Some(body) = req.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.text().await?;

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
            set_cookie,
        })
    }

    async fn fetch_me(&self, token: &str) -> Result<MeProfile, BackendError> {
        let response = self
            .http
            .get(self.url("/auth/me", None))
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(COOKIE, format!("{AUTH_TOKEN_COOKIE_KEY}={token}"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProfileLookup for BackendClient {
    /// Best-effort lookup; every failure collapses to `None` so the login
    /// router can fall through to its next tier.
    async fn lookup_profile_id(&self, token: &str) -> Option<i64> {
        match self.fetch_me(token).await {
            Ok(profile) => profile.id,
            Err(err) => {
                tracing::debug!("profile lookup failed: {err}");
                None
            }
        }
    }
}

#[cfg(feature = "test-utils")]
pub mod test_utils {
    use std::collections::HashMap;

    use tokio::sync::Mutex;

    use super::*;

    /// Scripted backend client for handler tests. Replies are keyed by
    /// backend path so concurrent forwards stay deterministic.
    #[derive(Default)]
    pub struct MockBackendClient {
        pub forward_reqs: Mutex<Vec<ForwardRequest>>,
        pub forward_resps: Mutex<HashMap<String, Result<ForwardedResponse, BackendError>>>,

        pub fetch_me_req: Mutex<Option<String>>,
        pub fetch_me_resp: Mutex<Option<Result<MeProfile, BackendError>>>,
    }

    impl MockBackendClient {
        /// Scripts the reply for a backend path.
        pub async fn script_forward(
            &self,
            path: &str,
            resp: Result<ForwardedResponse, BackendError>,
        ) {
            self.forward_resps.lock().await.insert(path.to_string(), resp);
        }
    }

    #[async_trait]
    impl IBackendClient for MockBackendClient {
        async fn forward(&self, req: ForwardRequest) -> Result<ForwardedResponse, BackendError> {
            let path = req.path.clone();
            self.forward_reqs.lock().await.push(req);
            self.forward_resps
                .lock()
                .await
                .remove(&path)
                .unwrap_or_else(|| panic!("unscripted forward to {path}"))
        }

        async fn fetch_me(&self, token: &str) -> Result<MeProfile, BackendError> {
            *self.fetch_me_req.lock().await = Some(token.to_string());
            self.fetch_me_resp.lock().await.take().unwrap()
        }
    }

    #[async_trait]
    impl ProfileLookup for MockBackendClient {
        async fn lookup_profile_id(&self, token: &str) -> Option<i64> {
            match self.fetch_me(token).await {
                Ok(profile) => profile.id,
                Err(_) => None,
            }
        }
    }

    /// A JSON reply with the given status.
    pub fn json_response(status: StatusCode, body: &str) -> ForwardedResponse {
        ForwardedResponse {
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string(),
            set_cookie: Vec::new(),
        }
    }
}
