//! Bearer token authentication
//!
//! Token comparison runs in constant time.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::{AppError, AppState};
use crate::error::{Error, Result};

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        let _ = a.ct_eq(a);
        return false;
    }
    a.ct_eq(b).into()
}

/// Check `Authorization: Bearer <token>` against the configured key
///
/// With no key configured every request is rejected.
pub fn authorize(headers: &HeaderMap, expected: Option<&SecretString>) -> Result<()> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing authorization header".into()))?;

    let invalid_format = || Error::Unauthorized("Invalid authorization header format".into());
    let value = header.to_str().map_err(|_| invalid_format())?;

    let mut parts = value.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => return Err(invalid_format()),
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(Error::Unauthorized("Invalid authentication scheme".into()));
    }

    match expected {
        Some(key) if constant_time_eq(token, key.expose_secret()) => Ok(()),
        _ => Err(Error::Unauthorized("Invalid API key".into())),
    }
}

/// Middleware guarding the `/api` routes
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    if let Err(err) = authorize(request.headers(), state.api_key.as_ref()) {
        warn!(path = %request.uri().path(), "Rejected request: {}", err);
        return Err(err.into());
    }

    Ok(next.run(request).await)
}
