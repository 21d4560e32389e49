//! Token extraction from cookies and the `Authorization` header.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use common::jwt::parse_bearer;

/// Outcome of looking for a token on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction<'a> {
    /// A token was found.
    Found(&'a str),
    /// No cookie and no `Authorization` header.
    Absent,
    /// An `Authorization` header is present but unusable.
    Malformed,
}

/// Find the request token.
///
/// The named cookie wins over the `Authorization` header. An empty cookie
/// value counts as absent.
pub fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Extraction<'a> {
    if let Some(token) = find_cookie(headers, cookie_name) {
        return Extraction::Found(token);
    }

    let Some(value) = headers.get(AUTHORIZATION) else {
        return Extraction::Absent;
    };

    let Ok(value) = value.to_str() else {
        tracing::debug!(target: "edge.auth.gate", "Authorization header is not valid UTF-8");
        return Extraction::Malformed;
    };

    match parse_bearer(value) {
        Ok(Some(token)) => Extraction::Found(token),
        Ok(None) => Extraction::Absent,
        Err(e) => {
            tracing::debug!(target: "edge.auth.gate", error = %e, "Invalid Authorization header format");
            Extraction::Malformed
        }
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    if name.is_empty() {
        return None;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .find(|value| !value.is_empty())
}
