//! Test helpers shared across the workspace.

use base64::Engine as _;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use serde_json::{Value, json};

/// Builds a compact `header.payload.signature` token carrying the given
/// claims as its payload. The signature segment is garbage; nothing in this
/// workspace verifies it.
pub fn token_with_claims(claims: &Value) -> String {
    let header = BASE64_URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let payload = BASE64_URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

/// Builds a token whose payload segment encodes arbitrary (possibly
/// non-JSON) text.
pub fn token_with_raw_payload(payload: &str) -> String {
    let header = BASE64_URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let payload = BASE64_URL_SAFE_NO_PAD.encode(payload);
    format!("{header}.{payload}.sig")
}
