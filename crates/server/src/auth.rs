use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::config::AuthConfig;
use crate::state::AppState;
use crate::utils::json_error_response;

const REALM: &str = "Basic realm=\"Restricted\"";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Credentials to enforce, or `None` when auth is switched off.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        config.enabled.then(|| Self {
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn matches(&self, headers: &HeaderMap) -> bool {
        match extract_basic(headers) {
            Some(given) => given == *self,
            None => false,
        }
    }
}

pub fn extract_basic(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_basic(value)
}

/// Decodes an `Authorization: Basic <base64(user:pass)>` value.
pub fn parse_basic(value: &str) -> Option<Credentials> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let credentials = match &state.credentials {
        Some(credentials) => credentials,
        None => return next.run(req).await,
    };
    if credentials.matches(req.headers()) {
        return next.run(req).await;
    }
    debug!("Rejected unauthenticated request to {}", req.uri().path());
    let mut response = json_error_response(StatusCode::UNAUTHORIZED, "unauthorized");
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn parses_basic_header() {
        // "admin:s3cr:et" keeps everything after the first colon.
        let encoded = STANDARD.encode("admin:s3cr:et");
        assert_eq!(
            parse_basic(&format!("Basic {}", encoded)),
            Some(creds("admin", "s3cr:et"))
        );
        assert_eq!(
            parse_basic(&format!("basic {}", STANDARD.encode("u:"))),
            Some(creds("u", ""))
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic"), None);
        assert_eq!(parse_basic("Basic !!!not-base64"), None);
        assert_eq!(parse_basic(&format!("Basic {}", STANDARD.encode("nocolon"))), None);
    }

    #[test]
    fn matches_against_headers() {
        let expected = creds("admin", "pw");
        let mut headers = HeaderMap::new();
        assert!(!expected.matches(&headers));

        let value = format!("Basic {}", STANDARD.encode("admin:pw"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        assert!(expected.matches(&headers));

        let wrong = format!("Basic {}", STANDARD.encode("admin:nope"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&wrong).unwrap());
        assert!(!expected.matches(&headers));
    }

    #[test]
    fn disabled_config_yields_no_credentials() {
        let mut config = AuthConfig {
            enabled: false,
            username: "a".to_string(),
            password: "b".to_string(),
        };
        assert_eq!(Credentials::from_config(&config), None);
        config.enabled = true;
        assert_eq!(Credentials::from_config(&config), Some(creds("a", "b")));
    }
}
