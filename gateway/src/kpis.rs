//! Admin dashboard KPIs.
//!
//! Six best-effort counts gathered concurrently from the backend. A
//! failed count degrades to zero; the dashboard always renders.

use axum::Json;
use axum::extract::State;
use axum_macros::debug_handler;
use backend::ForwardRequest;
use chrono::{Local, NaiveDate};
use http::Method;
use serde_json::{Value, json};
use tracing::instrument;

use crate::extract::AuthToken;
use crate::server::Handler;
use crate::utils::truthy;

#[debug_handler]
#[instrument(skip(h, token))]
pub(crate) async fn kpis(State(h): State<Handler>, AuthToken(token): AuthToken) -> Json<Value> {
    let (users, materiels, fournisseurs, licences, tickets, contrats) = tokio::join!(
        count(&h, "/admin/users", &token),
        count(&h, "/materiels", &token),
        count(&h, "/fournisseurs", &token),
        count_active_licences(&h, &token),
        count(&h, "/tickets", &token),
        count(&h, "/contrats", &token),
    );

    Json(json!({
        "utilisateursActifs": users.unwrap_or(0),
        "equipements": materiels.unwrap_or(0),
        "licencesActives": licences.unwrap_or(0),
        "ticketsOuverts": tickets.unwrap_or(0),
        "fournisseurs": fournisseurs.unwrap_or(0),
        "contratsActifs": contrats.unwrap_or(0),
        "trends": {
            "utilisateursActifs": null,
            "equipements": null,
            "licencesActives": null,
            "ticketsOuverts": null,
            "fournisseurs": null,
            "contratsActifs": null,
        },
    }))
}

async fn fetch_json(h: &Handler, path: &str, token: &Option<String>) -> Option<Value> {
    let mut req = ForwardRequest::new(Method::GET, path);
    if let Some(token) = token {
        req = req.with_token(token);
    }
    let reply = h.backend.forward(req).await.ok()?;
    if !reply.is_ok() {
        return None;
    }
    serde_json::from_str(&reply.body).ok()
}

/// Counts whatever shape the backend answers with: a plain array, a
/// Spring page (`content`), a `count` field, an `items` array, or any
/// other truthy body counting as one.
async fn count(h: &Handler, path: &str, token: &Option<String>) -> Option<i64> {
    let data = fetch_json(h, path, token).await?;
    if let Some(list) = data.as_array() {
        return Some(list.len() as i64);
    }
    if let Some(content) = data.get("content").and_then(Value::as_array) {
        return Some(content.len() as i64);
    }
    if let Some(count) = data.get("count").and_then(Value::as_i64) {
        return Some(count);
    }
    if let Some(items) = data.get("items").and_then(Value::as_array) {
        return Some(items.len() as i64);
    }
    truthy(&data).then_some(1)
}

async fn count_active_licences(h: &Handler, token: &Option<String>) -> Option<i64> {
    let data = fetch_json(h, "/logiciels", token).await?;
    let list = data.as_array()?;
    let today = Local::now().date_naive();
    Some(
        list.iter()
            .filter(|licence| licence_is_active(licence, today))
            .count() as i64,
    )
}

/// A licence with no expiry date (or a blank/"null" placeholder) is
/// active; otherwise the expiry must be today or later.
fn licence_is_active(licence: &Value, today: NaiveDate) -> bool {
    let raw = [
        licence.get("dateExpiration"),
        licence.get("dateexpiration"),
    ]
    .into_iter()
    .flatten()
    .find(|value| !value.is_null());
    let text = match raw {
        None => return true,
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    };
    if text.is_empty() || text == "null" {
        return true;
    }
    match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        Ok(date) => date >= today,
        Err(_) => false,
    }
}
