//! The auth token cookie.

use chrono::Duration;
use http::HeaderValue;
use std::fmt;

/// The auth token cookie key.
pub const AUTH_TOKEN_COOKIE_KEY: &str = "auth_token";

/// The auth token cookie lifetime in seconds.
pub const AUTH_TOKEN_MAX_AGE_SECONDS: i64 = 24 * 60 * 60; // 24 hours

/// Representation of an HTTP cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cookie {
    /// The cookie's name.
    name: String,

    /// The cookie's value.
    value: String,

    /// The cookie's maximum age.
    max_age: Duration,

    /// The cookie's path.
    path: String,

    /// Whether this cookie is marked Secure.
    secure: bool,

    /// Whether this cookie is marked HttpOnly.
    http_only: bool,

    /// The `SameSite` attribute.
    same_site: SameSite,
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;

        if self.max_age.num_seconds() >= 0 {
            write!(f, "; Max-Age={}", self.max_age.num_seconds())?;
        }

        if !self.path.is_empty() {
            write!(f, "; Path={}", self.path)?;
        }

        if self.secure {
            write!(f, "; Secure")?;
        }

        if self.http_only {
            write!(f, "; HttpOnly")?;
        }

        write!(f, "; SameSite={}", self.same_site)?;

        Ok(())
    }
}

/// Creates the auth token cookie. `secure` is enabled in production
/// deployments only, so local http setups keep working.
pub fn create_auth_token_cookie<T: Into<String>>(token: T, secure: bool) -> Cookie {
    build_cookie(
        AUTH_TOKEN_COOKIE_KEY,
        token,
        Duration::seconds(AUTH_TOKEN_MAX_AGE_SECONDS),
        secure,
    )
}

/// Creates a cookie that instructs the browser to drop the auth token.
pub fn expire_auth_token_cookie() -> Cookie {
    build_cookie(AUTH_TOKEN_COOKIE_KEY, "", Duration::zero(), false)
}

fn build_cookie<N: Into<String>, V: Into<String>>(
    name: N,
    value: V,
    max_age: Duration,
    secure: bool,
) -> Cookie {
    Cookie {
        name: name.into(),
        value: value.into(),
        max_age,
        path: String::from("/"),
        secure,
        http_only: true,
        same_site: SameSite::Strict,
    }
}

/// Extracts the auth token from a `Cookie` (or `Set-Cookie`) header value.
pub fn extract_auth_token_cookie(value: &HeaderValue) -> Option<String> {
    extract_cookie_by_name(AUTH_TOKEN_COOKIE_KEY, value)
}

/// Extracts a cookie by name from a cookie header value.
pub fn extract_cookie_by_name(name: &str, value: &HeaderValue) -> Option<String> {
    extract_cookie_value(name, value.to_str().ok()?)
}

/// Extracts a cookie by name from raw `Cookie`/`Set-Cookie` header text.
pub fn extract_cookie_value(name: &str, cookie_str: &str) -> Option<String> {
    cookie_str
        .split(';')
        .map(str::trim)
        .filter_map(|cookie| cookie.split_once('='))
        .find_map(|(k, v)| (k == name).then(|| v.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SameSite {
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SameSite::Strict => write!(f, "Strict"),
        }
    }
}

/// A helper extension for attaching cookies to HTTP responses.
pub trait ResponseCookies {
    /// Adds a single [`Cookie`] to the response.
    fn with_cookie(self, cookie: Cookie) -> Self;
}

impl ResponseCookies for http::response::Builder {
    fn with_cookie(self, cookie: Cookie) -> Self {
        self.header(
            http::header::SET_COOKIE,
            HeaderValue::from_str(&cookie.to_string()).expect("valid cookie"),
        )
    }
}

#[cfg(test)]
mod tests {
    use http::header::SET_COOKIE;

    use super::*;

    #[test]
    fn test_auth_token_cookie() {
        // when
        let cookie = create_auth_token_cookie("token-value", false);

        // then
        assert_eq!(
            cookie.to_string(),
            "auth_token=token-value; Max-Age=86400; Path=/; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_auth_token_cookie_secure() {
        // when
        let cookie = create_auth_token_cookie("token-value", true);

        // then
        assert_eq!(
            cookie.to_string(),
            "auth_token=token-value; Max-Age=86400; Path=/; Secure; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_expired_cookie() {
        // when
        let cookie = expire_auth_token_cookie();

        // then
        assert_eq!(
            cookie.to_string(),
            "auth_token=; Max-Age=0; Path=/; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_extract_cookie() {
        // given
        let header = HeaderValue::from_static("theme=dark; auth_token=abc.def.ghi; lang=fr");

        // when
        let token = extract_auth_token_cookie(&header);

        // then
        assert_eq!(token, Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_extract_from_set_cookie_value() {
        // given: the shape the backend sends back at login
        let header =
            HeaderValue::from_static("auth_token=abc.def.ghi; Max-Age=86400; Path=/; HttpOnly");

        // when
        let token = extract_auth_token_cookie(&header);

        // then
        assert_eq!(token, Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_extract_missing() {
        let header = HeaderValue::from_static("theme=dark");
        assert_eq!(extract_auth_token_cookie(&header), None);
    }

    #[test]
    fn test_response_with_cookie() {
        // when
        let response = http::Response::builder()
            .with_cookie(expire_auth_token_cookie())
            .body(())
            .unwrap();

        // then
        assert_eq!(
            response.headers().get(SET_COOKIE).unwrap(),
            "auth_token=; Max-Age=0; Path=/; HttpOnly; SameSite=Strict"
        );
    }
}
