//! Status-transparent relays to the backend's CRUD and chat endpoints.
//!
//! Each route forwards the caller's auth cookie and relays the backend's
//! status and body as-is; the few quirks (Spring page unwrapping, the
//! chat reply shapes) mirror what the dashboard expects.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum_macros::debug_handler;
use backend::{ForwardRequest, ForwardedResponse};
use http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{Method, StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::ApiError;
use crate::extract::AuthToken;
use crate::server::Handler;
use crate::utils::truthy;

/// Relays a backend reply as-is: status, content type, body and any
/// `Set-Cookie` headers.
fn relay(reply: ForwardedResponse) -> Result<Response, ApiError> {
    let mut builder = Response::builder().status(reply.status).header(
        CONTENT_TYPE,
        reply
            .content_type
            .unwrap_or_else(|| String::from("application/json")),
    );
    for cookie in reply.set_cookie {
        builder = builder.header(SET_COOKIE, cookie);
    }
    Ok(builder.body(Body::from(reply.body))?)
}

fn authed(req: ForwardRequest, token: &Option<String>) -> ForwardRequest {
    match token {
        Some(token) => req.with_token(token),
        None => req,
    }
}

/// Bodies are forwarded as JSON; anything unparsable becomes `{}` so the
/// backend sees a well-formed request.
fn json_or_empty(body: String) -> String {
    if serde_json::from_str::<Value>(&body).is_ok() {
        body
    } else {
        String::from("{}")
    }
}

/// A plain array is kept, a Spring page is unwrapped, anything else
/// becomes an empty list.
fn normalize_list(body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(list)) => Value::Array(list),
        Ok(mut data) => match data.get_mut("content") {
            Some(content) if content.is_array() => content.take(),
            _ => json!([]),
        },
        Err(_) => json!([]),
    }
}

/// Splits the `id` parameter off a query map and re-encodes the rest.
fn split_id_query(query: &BTreeMap<String, String>) -> (Option<String>, String) {
    let id = query.get("id").cloned();
    let mut rest = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        if key != "id" {
            rest.append_pair(key, value);
        }
    }
    (id, rest.finish())
}

// ---------- materiels ----------

/// Lists equipment, normalized to a JSON array.
#[debug_handler]
#[instrument(skip(h, token), err)]
pub(crate) async fn list_materiels(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
) -> Result<Response, ApiError> {
    let reply = h
        .backend
        .forward(authed(ForwardRequest::new(Method::GET, "/materiels"), &token))
        .await?;
    Ok((reply.status, Json(normalize_list(&reply.body))).into_response())
}

#[debug_handler]
#[instrument(skip(h, token, body), err)]
pub(crate) async fn create_materiel(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    body: String,
) -> Result<Response, ApiError> {
    let req = authed(ForwardRequest::new(Method::POST, "/materiels"), &token)
        .with_body(json_or_empty(body));
    relay(h.backend.forward(req).await?)
}

#[debug_handler]
#[instrument(skip(h, token, body), err)]
pub(crate) async fn update_materiel(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    Query(query): Query<BTreeMap<String, String>>,
    body: String,
) -> Result<Response, ApiError> {
    let Some(id) = query.get("id") else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "id is required"));
    };
    let req = authed(
        ForwardRequest::new(Method::PUT, format!("/materiels/{id}")),
        &token,
    )
    .with_body(json_or_empty(body));
    relay(h.backend.forward(req).await?)
}

#[debug_handler]
#[instrument(skip(h, token), err)]
pub(crate) async fn delete_materiel(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let Some(id) = query.get("id") else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "id is required"));
    };
    let reply = h
        .backend
        .forward(authed(
            ForwardRequest::new(Method::DELETE, format!("/materiels/{id}")),
            &token,
        ))
        .await?;
    if reply.is_ok() {
        return Ok(Json(json!({"ok": true})).into_response());
    }
    relay(reply)
}

/// The caller's own equipment: `/materiels/mine` first, then the
/// per-user endpoint, then an empty list.
#[debug_handler]
#[instrument(skip(h, token), err)]
pub(crate) async fn my_materiels(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
) -> Result<Response, ApiError> {
    let Some(token) = token else {
        return Ok(Json(json!([])).into_response());
    };
    let Some(user_id) = session::accessor::id_from_token(&token) else {
        return Ok(Json(json!([])).into_response());
    };

    let mine = h
        .backend
        .forward(ForwardRequest::new(Method::GET, "/materiels/mine").with_token(&token))
        .await;
    if let Ok(reply) = mine
        && reply.is_ok()
    {
        return Ok(Json(normalize_list(&reply.body)).into_response());
    }

    let fallback = h
        .backend
        .forward(
            ForwardRequest::new(Method::GET, format!("/materiels/user/{user_id}"))
                .with_token(&token),
        )
        .await;
    match fallback {
        Ok(reply) if reply.is_ok() => Ok(Json(normalize_list(&reply.body)).into_response()),
        _ => Ok(Json(json!([])).into_response()),
    }
}

// ---------- logiciels ----------

/// Lists software; `?id=` narrows to one record, `?materielId=` filters
/// by equipment.
#[debug_handler]
#[instrument(skip(h, token), err)]
pub(crate) async fn list_logiciels(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let req = match (query.get("id"), query.get("materielId")) {
        (Some(id), _) => ForwardRequest::new(Method::GET, format!("/logiciels/{id}")),
        (None, Some(materiel_id)) => ForwardRequest::new(Method::GET, "/logiciels")
            .with_query(format!("materielId={materiel_id}")),
        (None, None) => ForwardRequest::new(Method::GET, "/logiciels"),
    };
    relay(h.backend.forward(authed(req, &token)).await?)
}

#[debug_handler]
#[instrument(skip(h, token, body), err)]
pub(crate) async fn create_logiciel(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    body: String,
) -> Result<Response, ApiError> {
    let req = authed(ForwardRequest::new(Method::POST, "/logiciels"), &token).with_body(body);
    relay(h.backend.forward(req).await?)
}

#[debug_handler]
#[instrument(skip(h, token, body), err)]
pub(crate) async fn update_logiciel(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    Query(query): Query<BTreeMap<String, String>>,
    body: String,
) -> Result<Response, ApiError> {
    let Some(id) = query.get("id") else {
        return Ok(message_response(StatusCode::BAD_REQUEST, "Missing id"));
    };
    let req = authed(
        ForwardRequest::new(Method::PUT, format!("/logiciels/{id}")),
        &token,
    )
    .with_body(body);
    relay(h.backend.forward(req).await?)
}

#[debug_handler]
#[instrument(skip(h, token), err)]
pub(crate) async fn delete_logiciel(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let Some(id) = query.get("id") else {
        return Ok(message_response(StatusCode::BAD_REQUEST, "Missing id"));
    };
    let req = authed(
        ForwardRequest::new(Method::DELETE, format!("/logiciels/{id}")),
        &token,
    );
    relay(h.backend.forward(req).await?)
}

// ---------- fournisseurs ----------

/// Lists suppliers; `?id=` moves into the path, remaining query
/// parameters are forwarded.
#[debug_handler]
#[instrument(skip(h, token), err)]
pub(crate) async fn list_fournisseurs(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let (id, rest) = split_id_query(&query);
    let path = match id {
        Some(id) => format!("/fournisseurs/{id}"),
        None => String::from("/fournisseurs"),
    };
    let req = authed(ForwardRequest::new(Method::GET, path).with_query(rest), &token);
    relay(h.backend.forward(req).await?)
}

#[debug_handler]
#[instrument(skip(h, token, body), err)]
pub(crate) async fn create_fournisseur(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    body: String,
) -> Result<Response, ApiError> {
    let req = authed(ForwardRequest::new(Method::POST, "/fournisseurs"), &token)
        .with_body(json_or_empty(body));
    relay(h.backend.forward(req).await?)
}

#[debug_handler]
#[instrument(skip(h, token, body), err)]
pub(crate) async fn update_fournisseur(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    Query(query): Query<BTreeMap<String, String>>,
    body: String,
) -> Result<Response, ApiError> {
    let Some(id) = query.get("id") else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing id"));
    };
    let req = authed(
        ForwardRequest::new(Method::PUT, format!("/fournisseurs/{id}")),
        &token,
    )
    .with_body(json_or_empty(body));
    relay(h.backend.forward(req).await?)
}

#[debug_handler]
#[instrument(skip(h, token), err)]
pub(crate) async fn delete_fournisseur(
    State(h): State<Handler>,
    AuthToken(token): AuthToken,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let Some(id) = query.get("id") else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing id"));
    };
    let reply = h
        .backend
        .forward(authed(
            ForwardRequest::new(Method::DELETE, format!("/fournisseurs/{id}")),
            &token,
        ))
        .await?;
    if reply.status == StatusCode::NO_CONTENT {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    relay(reply)
}

// ---------- tickets ----------

/// Lists tickets, forwarding the inbound cookie header verbatim.
#[debug_handler]
#[instrument(skip(h, headers), err)]
pub(crate) async fn get_tickets(
    State(h): State<Handler>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(cookie) = cookie_header(&headers) else {
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication required - no cookies found",
        ));
    };
    let req = ForwardRequest::new(Method::GET, "/tickets").with_cookie_header(cookie);
    relay(h.backend.forward(req).await?)
}

#[debug_handler]
#[instrument(skip(h, headers, body), err)]
pub(crate) async fn create_ticket(
    State(h): State<Handler>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    let Some(cookie) = cookie_header(&headers) else {
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication required - no cookies found",
        ));
    };
    let req = ForwardRequest::new(Method::POST, "/tickets")
        .with_cookie_header(cookie)
        .with_body(json_or_empty(body));
    relay(h.backend.forward(req).await?)
}

fn cookie_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

// ---------- chatbot ----------

/// Relays a chat message; the reply field varies per chat backend, so
/// the common shapes are unwrapped into a single `answer` string.
#[debug_handler]
#[instrument(skip(h, headers, body), err)]
pub(crate) async fn chatbot(
    State(h): State<Handler>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    let Ok(parsed) = serde_json::from_str::<Value>(&body) else {
        return Ok(message_response(StatusCode::BAD_REQUEST, "JSON invalide"));
    };
    let message = match parsed.get("message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if message.is_empty() {
        return Ok(message_response(StatusCode::BAD_REQUEST, "message requis"));
    }

    let payload = json!({ "message": message }).to_string();
    let cookie = cookie_header(&headers);

    let mut reply = chat_call(&h, "/utilisateur/chatbot", &payload, &cookie).await?;
    if reply.status == StatusCode::NOT_FOUND {
        reply = chat_call(&h, "/chatbot", &payload, &cookie).await?;
    }

    let is_json = reply
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json"));
    let data = is_json
        .then(|| serde_json::from_str::<Value>(&reply.body).ok())
        .flatten();

    if !reply.is_ok() {
        let message = data
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| (!reply.body.is_empty()).then(|| reply.body.clone()))
            .unwrap_or_else(|| String::from("Erreur backend"));
        return Ok(message_response(reply.status, &message));
    }

    if let Some(data) = &data {
        let error_flag = data.get("error") == Some(&Value::Bool(true));
        let answer_missing = !data.get("answer").is_some_and(truthy);
        let has_message = data.get("message").is_some_and(truthy);
        if error_flag || (answer_missing && has_message) {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Erreur backend");
            return Ok(message_response(StatusCode::BAD_GATEWAY, message));
        }
    }

    let answer = match &data {
        Some(data) => extract_answer(data),
        None => reply.body.clone(),
    };
    Ok(Json(json!({ "answer": answer })).into_response())
}

/// Liveness probe used by the chat widget.
#[debug_handler]
pub(crate) async fn chatbot_health() -> Json<Value> {
    Json(json!({ "ok": true, "name": "chatbot" }))
}

async fn chat_call(
    h: &Handler,
    path: &str,
    payload: &str,
    cookie: &Option<String>,
) -> Result<ForwardedResponse, ApiError> {
    let mut req = ForwardRequest::new(Method::POST, path).with_body(payload.to_string());
    if let Some(cookie) = cookie {
        req = req.with_cookie_header(cookie.clone());
    }
    Ok(h.backend.forward(req).await?)
}

/// Unwraps the chat reply: `answer`/`response`/`text`, including answers
/// that are themselves JSON-encoded chat payloads.
fn extract_answer(data: &Value) -> String {
    let raw = ["answer", "response", "text"]
        .iter()
        .filter_map(|key| data.get(*key))
        .find(|value| !value.is_null());
    let text = match raw {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(nested) => nested
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .or_else(|| nested.get("response").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or(text),
        Err(_) => text,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use backend::test_utils::{MockBackendClient, json_response};
    use rstest::rstest;
    use serde_json::json;
    use testutils::token_with_claims;

    use super::*;
    use crate::fixture::{response_json, response_text, test_handler};

    fn query(pairs: &[(&str, &str)]) -> Query<BTreeMap<String, String>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[rstest]
    #[case::plain_array(r#"[1, 2]"#, json!([1, 2]))]
    #[case::spring_page(r#"{"content": [1]}"#, json!([1]))]
    #[case::object_without_content(r#"{"x": 1}"#, json!([]))]
    #[case::not_json("oops", json!([]))]
    fn test_normalize_list(#[case] body: &str, #[case] want: Value) {
        assert_eq!(normalize_list(body), want);
    }

    #[test]
    fn test_split_id_query() {
        // given
        let query: BTreeMap<String, String> = [("id", "5"), ("page", "2"), ("size", "10")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        // when
        let (id, rest) = split_id_query(&query);

        // then
        assert_eq!(id.as_deref(), Some("5"));
        assert_eq!(rest, "page=2&size=10");
    }

    #[tokio::test]
    async fn test_list_materiels_unwraps_spring_page() {
        // given
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward(
            "/materiels",
            Ok(json_response(StatusCode::OK, r#"{"content": [{"id": 1}]}"#)),
        )
        .await;
        let h = test_handler(mock.clone());
        let token = token_with_claims(&json!({"userId": 3}));

        // when
        let response = list_materiels(State(h), AuthToken(Some(token.clone())))
            .await
            .unwrap();

        // then: list unwrapped and auth headers rebuilt from the cookie
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, json!([{"id": 1}]));
        let reqs = mock.forward_reqs.lock().await;
        assert_eq!(reqs[0].bearer.as_deref(), Some(token.as_str()));
        assert_eq!(
            reqs[0].cookie.as_deref(),
            Some(format!("auth_token={token}").as_str())
        );
    }

    #[tokio::test]
    async fn test_list_materiels_relays_status() {
        // given
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward(
            "/materiels",
            Ok(json_response(StatusCode::FORBIDDEN, r#"{"error": "nope"}"#)),
        )
        .await;
        let h = test_handler(mock);

        // when
        let response = list_materiels(State(h), AuthToken(None)).await.unwrap();

        // then: status transparent, unusable body normalized to a list
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_update_materiel_requires_id() {
        // given
        let h = test_handler(Arc::new(MockBackendClient::default()));

        // when
        let response = update_materiel(State(h), AuthToken(None), query(&[]), String::new())
            .await
            .unwrap();

        // then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response_json(response).await,
            json!({"error": "id is required"})
        );
    }

    #[tokio::test]
    async fn test_delete_materiel_maps_success() {
        // given
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward("/materiels/5", Ok(json_response(StatusCode::OK, "")))
            .await;
        let h = test_handler(mock);

        // when
        let response = delete_materiel(State(h), AuthToken(None), query(&[("id", "5")]))
            .await
            .unwrap();

        // then
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_my_materiels_falls_back_to_user_endpoint() {
        // given: /materiels/mine is not implemented by this backend
        let token = token_with_claims(&json!({"userId": 3}));
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward(
            "/materiels/mine",
            Ok(json_response(StatusCode::NOT_FOUND, "")),
        )
        .await;
        mock.script_forward(
            "/materiels/user/3",
            Ok(json_response(StatusCode::OK, r#"[{"id": 9}]"#)),
        )
        .await;
        let h = test_handler(mock);

        // when
        let response = my_materiels(State(h), AuthToken(Some(token))).await.unwrap();

        // then
        assert_eq!(response_json(response).await, json!([{"id": 9}]));
    }

    #[tokio::test]
    async fn test_my_materiels_without_derivable_id() {
        // given: a token with no numeric id claim
        let token = token_with_claims(&json!({"sub": "jane@x.com"}));
        let h = test_handler(Arc::new(MockBackendClient::default()));

        // when
        let response = my_materiels(State(h), AuthToken(Some(token))).await.unwrap();

        // then: empty list, no backend call attempted
        assert_eq!(response_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_list_fournisseurs_routes_id_into_path() {
        // given
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward(
            "/fournisseurs/7",
            Ok(json_response(StatusCode::OK, r#"{"id": 7}"#)),
        )
        .await;
        let h = test_handler(mock.clone());

        // when
        let response = list_fournisseurs(
            State(h),
            AuthToken(None),
            query(&[("id", "7"), ("page", "1")]),
        )
        .await
        .unwrap();

        // then: id in the path, the rest of the query forwarded
        assert_eq!(response.status(), StatusCode::OK);
        let reqs = mock.forward_reqs.lock().await;
        assert_eq!(reqs[0].path, "/fournisseurs/7");
        assert_eq!(reqs[0].query.as_deref(), Some("page=1"));
    }

    #[tokio::test]
    async fn test_delete_fournisseur_preserves_no_content() {
        // given
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward(
            "/fournisseurs/7",
            Ok(json_response(StatusCode::NO_CONTENT, "")),
        )
        .await;
        let h = test_handler(mock);

        // when
        let response = delete_fournisseur(State(h), AuthToken(None), query(&[("id", "7")]))
            .await
            .unwrap();

        // then
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_list_logiciels_by_materiel() {
        // given
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward("/logiciels", Ok(json_response(StatusCode::OK, "[]")))
            .await;
        let h = test_handler(mock.clone());

        // when
        list_logiciels(State(h), AuthToken(None), query(&[("materielId", "4")]))
            .await
            .unwrap();

        // then
        let reqs = mock.forward_reqs.lock().await;
        assert_eq!(reqs[0].query.as_deref(), Some("materielId=4"));
    }

    #[tokio::test]
    async fn test_get_tickets_requires_cookies() {
        // given
        let h = test_handler(Arc::new(MockBackendClient::default()));

        // when
        let response = get_tickets(State(h), HeaderMap::new()).await.unwrap();

        // then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response_json(response).await,
            json!({"error": "Authentication required - no cookies found"})
        );
    }

    #[tokio::test]
    async fn test_get_tickets_forwards_cookie_verbatim() {
        // given
        let mock = Arc::new(MockBackendClient::default());
        let mut reply = json_response(StatusCode::OK, "[]");
        reply
            .set_cookie
            .push(String::from("session=refresh; Path=/"));
        mock.script_forward("/tickets", Ok(reply)).await;
        let h = test_handler(mock.clone());
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "auth_token=abc; theme=dark".parse().unwrap());

        // when
        let response = get_tickets(State(h), headers).await.unwrap();

        // then: cookie forwarded untouched, backend Set-Cookie relayed
        assert_eq!(
            response.headers().get(SET_COOKIE).unwrap(),
            "session=refresh; Path=/"
        );
        let reqs = mock.forward_reqs.lock().await;
        assert_eq!(reqs[0].cookie.as_deref(), Some("auth_token=abc; theme=dark"));
        assert_eq!(reqs[0].bearer, None);
    }

    #[rstest]
    #[case::invalid_json("not json", "JSON invalide")]
    #[case::missing_message("{}", "message requis")]
    #[case::empty_message(r#"{"message": ""}"#, "message requis")]
    #[tokio::test]
    async fn test_chatbot_rejects_bad_input(#[case] body: &str, #[case] want: &str) {
        // given
        let h = test_handler(Arc::new(MockBackendClient::default()));

        // when
        let response = chatbot(State(h), HeaderMap::new(), body.to_string())
            .await
            .unwrap();

        // then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await, json!({"message": want}));
    }

    #[tokio::test]
    async fn test_chatbot_falls_back_on_404() {
        // given: the user-scoped chat endpoint does not exist
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward(
            "/utilisateur/chatbot",
            Ok(json_response(StatusCode::NOT_FOUND, "")),
        )
        .await;
        mock.script_forward(
            "/chatbot",
            Ok(json_response(StatusCode::OK, r#"{"answer": "Bonjour!"}"#)),
        )
        .await;
        let h = test_handler(mock);

        // when
        let response = chatbot(
            State(h),
            HeaderMap::new(),
            json!({"message": "salut"}).to_string(),
        )
        .await
        .unwrap();

        // then
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, json!({"answer": "Bonjour!"}));
    }

    #[rstest]
    #[case::answer_field(json!({"answer": "hi"}), "hi")]
    #[case::response_field(json!({"response": "hello"}), "hello")]
    #[case::text_field(json!({"text": "hey"}), "hey")]
    #[case::nested_chat_payload(
        json!({"answer": r#"{"message": {"content": "unwrapped"}}"#}),
        "unwrapped"
    )]
    #[case::nested_response(json!({"answer": r#"{"response": "inner"}"#}), "inner")]
    #[case::non_string_answer(json!({"answer": 42}), "42")]
    fn test_extract_answer(#[case] data: Value, #[case] want: &str) {
        assert_eq!(extract_answer(&data), want);
    }

    #[tokio::test]
    async fn test_chatbot_error_payload_maps_to_bad_gateway() {
        // given: a 200 reply that is actually an error message
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward(
            "/utilisateur/chatbot",
            Ok(json_response(
                StatusCode::OK,
                r#"{"message": "quota exceeded"}"#,
            )),
        )
        .await;
        let h = test_handler(mock);

        // when
        let response = chatbot(
            State(h),
            HeaderMap::new(),
            json!({"message": "salut"}).to_string(),
        )
        .await
        .unwrap();

        // then
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response_json(response).await,
            json!({"message": "quota exceeded"})
        );
    }

    #[tokio::test]
    async fn test_chatbot_non_json_reply_is_the_answer() {
        // given: a plain-text chat backend
        let mock = Arc::new(MockBackendClient::default());
        mock.script_forward(
            "/utilisateur/chatbot",
            Ok(ForwardedResponse {
                status: StatusCode::OK,
                content_type: Some(String::from("text/plain")),
                body: String::from("Bonjour!"),
                set_cookie: Vec::new(),
            }),
        )
        .await;
        let h = test_handler(mock);

        // when
        let response = chatbot(
            State(h),
            HeaderMap::new(),
            json!({"message": "salut"}).to_string(),
        )
        .await
        .unwrap();

        // then
        assert_eq!(response_json(response).await, json!({"answer": "Bonjour!"}));
    }

    #[tokio::test]
    async fn test_relay_passes_text_body() {
        // given
        let reply = ForwardedResponse {
            status: StatusCode::CREATED,
            content_type: Some(String::from("text/plain")),
            body: String::from("created"),
            set_cookie: Vec::new(),
        };

        // when
        let response = relay(reply).unwrap();

        // then
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert_eq!(response_text(response).await, "created");
    }
}
