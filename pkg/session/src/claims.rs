//! Claims normalization.
//!
//! The backend has gone through several token shapes, so every identity
//! field can arrive under more than one claim key. Each field is resolved
//! by walking a fixed candidate list in priority order; the first usable
//! candidate wins and later ones are never consulted.

use std::fmt;

use serde_json::Value;

use crate::token::ClaimsMap;

/// Display name used when neither name claims nor an email are present.
pub const DEFAULT_DISPLAY_NAME: &str = "Utilisateur";

/// Normalized user role.
///
/// The only role representation that leaves this module. Raw spellings
/// such as `ROLE_ADMIN` or `tech` stay behind [`Role::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Technicien,
    User,
}

impl Role {
    /// Parses a raw role claim value.
    ///
    /// Matching is case-insensitive, a leading `ROLE_` prefix is stripped,
    /// and `TECH` is accepted as shorthand for `TECHNICIEN`. Anything else
    /// is unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.to_uppercase();
        let stripped = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match stripped {
            "TECH" | "TECHNICIEN" => Some(Self::Technicien),
            "ADMIN" => Some(Self::Admin),
            "USER" => Some(Self::User),
            _ => None,
        }
    }

    /// The canonical wire spelling of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Technicien => "TECHNICIEN",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity derived from a decoded token, every field already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Best-effort numeric id; absent when no claim coerces to a number.
    pub id: Option<i64>,
    /// Resolved email, empty when no email-ish claim is present.
    pub email: String,
    /// Human-readable name, synthesized from the email when necessary.
    pub display_name: String,
    /// Normalized role, defaulting to [`Role::User`].
    pub role: Role,
}

impl Identity {
    /// Derives a normalized identity from raw claims.
    pub fn from_claims(claims: &ClaimsMap) -> Self {
        Self {
            id: extract_id(claims),
            email: extract_email(claims).unwrap_or_default(),
            display_name: display_name(claims)
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            role: extract_role(claims).unwrap_or(Role::User),
        }
    }
}

const EMAIL_KEYS: [&str; 5] = ["email", "sub", "username", "user_name", "preferred_username"];
const ID_KEYS: [&str; 4] = ["id", "userId", "user_id", "uid"];
const FIRST_NAME_KEYS: [&str; 3] = ["prenom", "firstName", "given_name"];
const LAST_NAME_KEYS: [&str; 3] = ["nom", "lastName", "family_name"];

/// Extracts the normalized role.
///
/// Candidates in order: a singular `role` string, the first element of a
/// `roles` array, the `authority` field of the first element of an
/// `authorities` array. The first candidate that parses wins, so an
/// unrecognized `role` does not shadow a usable `roles` entry.
pub fn extract_role(claims: &ClaimsMap) -> Option<Role> {
    role_candidates(claims).into_iter().flatten().find_map(Role::parse)
}

fn role_candidates(claims: &ClaimsMap) -> [Option<&str>; 3] {
    [
        claims.get("role").and_then(Value::as_str),
        claims
            .get("roles")
            .and_then(Value::as_array)
            .and_then(|roles| roles.first())
            .and_then(Value::as_str),
        claims
            .get("authorities")
            .and_then(Value::as_array)
            .and_then(|authorities| authorities.first())
            .and_then(|authority| authority.get("authority"))
            .and_then(Value::as_str),
    ]
}

/// Extracts the email: first non-empty string among the email-ish claim
/// keys, `sub` included unconditionally.
pub fn extract_email(claims: &ClaimsMap) -> Option<String> {
    EMAIL_KEYS.iter().find_map(|key| {
        claims
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Extracts the numeric id.
///
/// The first present (non-null) claim among `id`, `userId`, `user_id` and
/// `uid` is taken, falling back to `sub` only when `sub` is a string that
/// does not look like an email. The chosen value is then coerced to an
/// integer; a value that does not coerce means no id at all, the next
/// candidate is not retried.
pub fn extract_id(claims: &ClaimsMap) -> Option<i64> {
    let raw = first_present(claims, &ID_KEYS).or_else(|| {
        claims
            .get("sub")
            .filter(|sub| sub.as_str().is_some_and(|s| !s.contains('@')))
    });
    raw.and_then(coerce_integer)
}

/// First name, from `prenom`/`firstName`/`given_name`.
pub fn extract_first_name(claims: &ClaimsMap) -> Option<String> {
    first_non_empty_str(claims, &FIRST_NAME_KEYS)
}

/// Last name, from `nom`/`lastName`/`family_name`.
pub fn extract_last_name(claims: &ClaimsMap) -> Option<String> {
    first_non_empty_str(claims, &LAST_NAME_KEYS)
}

/// Resolves a human-readable display name.
///
/// Name claims joined "first last" win, then a bare `name` claim, then a
/// name synthesized from the resolved email's local part (`.`, `_` and `-`
/// read as word separators). All variants are title-cased.
pub fn display_name(claims: &ClaimsMap) -> Option<String> {
    let by_fields = [extract_first_name(claims), extract_last_name(claims)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if !by_fields.trim().is_empty() {
        return Some(title_case(&by_fields));
    }

    if let Some(name) = claims
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
    {
        return Some(title_case(name));
    }

    extract_email(claims).map(|email| name_from_email(&email))
}

fn first_present<'a>(claims: &'a ClaimsMap, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| claims.get(*key))
        .find(|value| !value.is_null())
}

fn first_non_empty_str(claims: &ClaimsMap, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        claims
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let spaced: String = local
        .chars()
        .map(|c| if matches!(c, '.' | '_' | '-') { ' ' } else { c })
        .collect();
    title_case(&spaced)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
