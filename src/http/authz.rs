//! Per-subject authorization.
//!
//! Derived per-request from a verified session token. Downstream handlers
//! call [`AuthContext::authorize_owner`] with the resource-owner id: equal
//! subject → allow; unequal → admin only. The denial carries no detail
//! about the other subject's existence.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use carelock_session::SessionClaims;

/// HTTP-boundary access failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Missing/invalid credential on a protected resource.
    #[error("authentication required")]
    Unauthorized,

    /// Valid credential, failed ownership check.
    #[error("not authorized")]
    Forbidden,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AccessError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AccessError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };
        let body = ErrorBody {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

/// Authenticated request context, inserted into request extensions by the
/// session middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject_id: String,
    pub display_name: String,
    pub is_admin: bool,
}

impl AuthContext {
    pub fn from_claims(claims: &SessionClaims, is_admin: bool) -> Self {
        Self {
            subject_id: claims.subject_id.clone(),
            display_name: claims.display_name.clone(),
            is_admin,
        }
    }

    /// Compare the resource owner against the authenticated subject.
    pub fn authorize_owner(&self, owner_id: &str) -> Result<(), AccessError> {
        if self.subject_id == owner_id || self.is_admin {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }
}
