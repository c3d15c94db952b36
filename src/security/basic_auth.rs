//! HTTP Basic authentication (RFC 7617) in front of the bridge routes.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;

use crate::observability::metrics;
use crate::security::htpasswd::Htpasswd;

/// Credentials and realm checked by [`basic_auth_middleware`].
#[derive(Debug, Clone)]
pub struct BasicAuth {
    htpasswd: Arc<Htpasswd>,
    challenge: HeaderValue,
}

impl BasicAuth {
    pub fn new(htpasswd: Htpasswd, realm: &str) -> Self {
        let realm = realm.replace('\\', "\\\\").replace('"', "\\\"");
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{realm}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
        Self {
            htpasswd: Arc::new(htpasswd),
            challenge,
        }
    }

    /// Verify the request's credentials on the blocking pool.
    pub async fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some((user, password)) = credentials(headers) else {
            return false;
        };
        let htpasswd = self.htpasswd.clone();
        tokio::task::spawn_blocking(move || htpasswd.verify(&user, &password))
            .await
            .unwrap_or(false)
    }

    fn unauthorized(&self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, self.challenge.clone())],
            "Unauthorized",
        )
            .into_response()
    }
}

/// Rejects requests without valid credentials with 401 and a challenge.
pub async fn basic_auth_middleware(
    State(auth): State<BasicAuth>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if auth.authorize(request.headers()).await {
        return next.run(request).await;
    }
    tracing::debug!(path = %request.uri().path(), "Basic auth rejected request");
    metrics::record_request("unauthorized", StatusCode::UNAUTHORIZED.as_u16());
    auth.unauthorized()
}

/// Decode `Authorization: Basic <base64(user:password)>`.
fn credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}
