//! HTTP Basic credential extraction.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use base64::{Engine as _, engine::general_purpose};
use tracing::trace;

/// Username and password claimed by a request, not yet verified.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Extract credentials from an `Authorization: Basic ...` header.
/// Returns:
/// - None: no Authorization header, another scheme, or a header that does not decode
/// - Some(credentials): username and password as sent by the client
pub fn extract_basic_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;

    let (scheme, encoded) = auth_str.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        trace!("Ignoring Authorization header with scheme {}", scheme);
        return None;
    }

    let decoded = match general_purpose::STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            trace!("Basic credentials are not valid base64: {}", e);
            return None;
        }
    };
    let decoded = String::from_utf8(decoded).ok()?;

    // The username cannot contain a colon, the password can
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials::new(username, password))
}

/// Encode credentials as an `Authorization` header value.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", general_purpose::STANDARD.encode(format!("{username}:{password}")))
}
