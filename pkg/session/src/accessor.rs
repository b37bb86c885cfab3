//! Read-only identity queries over the stored token.
//!
//! Every accessor decodes the token fresh; nothing is cached within or
//! across calls. That keeps each call a pure function of its input at the
//! cost of repeated decode work, which is cheap at typical claim sizes.

use crate::claims::{self, Identity, Role};
use crate::token;

/// The normalized role, `None` when the token is malformed or carries no
/// recognizable role claim.
pub fn role_from_token(token: &str) -> Option<Role> {
    token::decode(token).as_ref().and_then(claims::extract_role)
}

/// The numeric user id, best-effort.
pub fn id_from_token(token: &str) -> Option<i64> {
    token::decode(token).as_ref().and_then(claims::extract_id)
}

/// The resolved email.
pub fn email_from_token(token: &str) -> Option<String> {
    token::decode(token).as_ref().and_then(claims::extract_email)
}

/// The resolved display name.
pub fn display_name_from_token(token: &str) -> Option<String> {
    token::decode(token).as_ref().and_then(claims::display_name)
}

/// The full normalized identity, `None` only when the token is malformed.
/// Individual fields fall back to their defaults.
pub fn identity_from_token(token: &str) -> Option<Identity> {
    token::decode(token).map(|claims| Identity::from_claims(&claims))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testutils::token_with_claims;

    use super::*;

    #[test]
    fn test_accessors_on_malformed_token() {
        assert_eq!(role_from_token("garbage"), None);
        assert_eq!(id_from_token("garbage"), None);
        assert_eq!(email_from_token("garbage"), None);
        assert_eq!(display_name_from_token("garbage"), None);
        assert_eq!(identity_from_token("garbage"), None);
    }

    #[test]
    fn test_accessors_decode_fresh() {
        // given
        let token = token_with_claims(&json!({
            "email": "jane.doe@x.com",
            "role": "ROLE_ADMIN",
            "id": 5,
        }));

        // then
        assert_eq!(role_from_token(&token), Some(Role::Admin));
        assert_eq!(id_from_token(&token), Some(5));
        assert_eq!(email_from_token(&token).as_deref(), Some("jane.doe@x.com"));
        assert_eq!(display_name_from_token(&token).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_identity_defaults_role() {
        // given: no role claim at all
        let token = token_with_claims(&json!({"email": "a@b.com"}));

        // then: the single-field accessor reports absence, the identity
        // defaults
        assert_eq!(role_from_token(&token), None);
        assert_eq!(identity_from_token(&token).unwrap().role, Role::User);
    }
}
