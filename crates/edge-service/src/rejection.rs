//! Responses for requests the auth gates turn away.
//!
//! The response depends only on configuration. The [`RejectionReason`] is
//! logged for operators and never changes what the client sees.

use crate::config::{JwtAuthConfig, NoTokenBehavior};
use crate::errors::StartupError;
use axum::http::header::{CONTENT_TYPE, LOCATION, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Body sent with `401` rejections.
pub const NOT_AUTHORIZED_BODY: &str = "Not authorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    NoToken,
    InvalidToken,
    NotInRequiredGroup,
}

impl RejectionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoToken => "no_token",
            Self::InvalidToken => "invalid_token",
            Self::NotInRequiredGroup => "not_in_required_group",
        }
    }
}

#[derive(Debug, Clone)]
enum Shape {
    Redirect {
        status: StatusCode,
        location: HeaderValue,
    },
    Challenge {
        www_authenticate: HeaderValue,
    },
}

/// Builds rejection responses from values validated once at startup.
#[derive(Debug, Clone)]
pub struct ErrorResponder {
    shape: Shape,
}

impl ErrorResponder {
    /// # Errors
    ///
    /// Returns `StartupError::InvalidHeaderValue` when the redirect URL cannot
    /// be carried in a `Location` or `WWW-Authenticate` header.
    pub fn from_config(jwt: &JwtAuthConfig) -> Result<Self, StartupError> {
        let shape = match jwt.no_token_behavior {
            NoTokenBehavior::Redirect(status) => Shape::Redirect {
                status,
                location: header_value("Location", &jwt.no_token_redirect_url)?,
            },
            NoTokenBehavior::Challenge => Shape::Challenge {
                www_authenticate: header_value(
                    "WWW-Authenticate",
                    &format!("Bearer realm=\"{}\"", jwt.no_token_redirect_url),
                )?,
            },
        };
        Ok(Self { shape })
    }

    pub fn status(&self) -> StatusCode {
        match &self.shape {
            Shape::Redirect { status, .. } => *status,
            Shape::Challenge { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    /// Answer a rejected request.
    pub fn reject(&self, reason: RejectionReason, path: &str) -> Response {
        tracing::info!(
            target: "edge.auth.reject",
            reason = reason.as_str(),
            path = %path,
            status = self.status().as_u16(),
            "Request rejected"
        );

        match &self.shape {
            Shape::Redirect { status, location } => {
                (*status, [(LOCATION, location.clone())]).into_response()
            }
            Shape::Challenge { www_authenticate } => (
                StatusCode::UNAUTHORIZED,
                [
                    (WWW_AUTHENTICATE, www_authenticate.clone()),
                    (
                        CONTENT_TYPE,
                        HeaderValue::from_static("text/plain; charset=utf-8"),
                    ),
                ],
                NOT_AUTHORIZED_BODY,
            )
                .into_response(),
        }
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, StartupError> {
    HeaderValue::from_str(value).map_err(|e| StartupError::InvalidHeaderValue {
        name,
        reason: e.to_string(),
    })
}
