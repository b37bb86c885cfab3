//! Compact-token payload decoding.
//!
//! Only the payload segment of the token is consumed. The signature is
//! never checked here: this tier trusts the backend that issued the token,
//! not the token itself. Every malformed input collapses to `None`, which
//! callers treat as "no session".

use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use serde_json::{Map, Value};

/// The decoded JSON payload of a token.
pub type ClaimsMap = Map<String, Value>;

/// Decodes the payload segment of a `header.payload.signature` token into
/// a claims map.
///
/// Returns `None` when the token has fewer than two dot-separated
/// segments, the payload is empty, base64 or UTF-8 decoding fails, or the
/// payload is not a JSON object.
pub fn decode(token: &str) -> Option<ClaimsMap> {
    let payload = token.split('.').nth(1)?;
    if payload.is_empty() {
        return None;
    }
    let text = base64url_decode_utf8(payload)?;
    match serde_json::from_str(&text) {
        Ok(Value::Object(claims)) => Some(claims),
        _ => None,
    }
}

/// Decodes base64url text into UTF-8: `-`/`_` are mapped back to `+`/`/`,
/// the input is right-padded with `=` to a multiple of four, then decoded
/// as standard base64.
fn base64url_decode_utf8(input: &str) -> Option<String> {
    let mut base64: String = input
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    while base64.len() % 4 != 0 {
        base64.push('=');
    }
    let bytes = BASE64_STANDARD.decode(base64.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use testutils::{token_with_claims, token_with_raw_payload};

    use super::*;

    #[rstest]
    #[case::empty("")]
    #[case::no_dots("not-a-token")]
    #[case::single_segment("eyJhbGciOiJIUzI1NiJ9")]
    fn test_decode_too_few_segments(#[case] token: &str) {
        assert_eq!(decode(token), None);
    }

    #[test]
    fn test_decode_empty_payload() {
        assert_eq!(decode("header..sig"), None);
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert_eq!(decode("header.!!not-base64!!.sig"), None);
    }

    #[rstest]
    #[case::plain_text("not json at all")]
    #[case::json_array("[1, 2, 3]")]
    #[case::json_string("\"just a string\"")]
    fn test_decode_non_object_payload(#[case] payload: &str) {
        // given
        let token = token_with_raw_payload(payload);

        // then
        assert_eq!(decode(&token), None);
    }

    #[test]
    fn test_decode_round_trip() {
        // given
        let claims = json!({
            "sub": "jane@x.com",
            "role": "ROLE_TECHNICIEN",
            "userId": 42,
            "nested": {"authority": "ROLE_ADMIN"},
        });
        let token = token_with_claims(&claims);

        // when
        let decoded = decode(&token);

        // then
        assert_eq!(decoded, Some(claims.as_object().unwrap().clone()));
    }

    #[test]
    fn test_decode_accepts_url_safe_alphabet() {
        // this payload encodes with a `_` and without padding, so both
        // translation and re-padding are exercised
        let claims = json!({"qq": "??"});
        let token = token_with_claims(&claims);

        assert_eq!(decode(&token), Some(claims.as_object().unwrap().clone()));
    }
}
