//! Session enforcement and security headers.
//!
//! `restrict` runs per request: public paths pass through, protected paths
//! require a verifiable session credential (cookie or bearer token). API
//! requests get a 401 JSON body on failure; browser requests are redirected
//! to the login page with the original path preserved. `security_headers`
//! attaches the fixed header set to every response regardless of outcome.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{self, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use carelock_session::SessionSigner;

use super::authz::{AccessError, AuthContext};
use super::policy::{RouteClass, RoutePolicy};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "carelock_session";

/// Shared state for the access-control middleware.
pub struct AccessControl {
    policy: RoutePolicy,
    signer: SessionSigner,
    admin_subjects: HashSet<String>,
}

impl AccessControl {
    pub fn new(policy: RoutePolicy, signer: SessionSigner) -> Self {
        Self {
            policy,
            signer,
            admin_subjects: HashSet::new(),
        }
    }

    /// Subjects granted the admin flag in their [`AuthContext`].
    pub fn with_admins<I, S>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_subjects = admins.into_iter().map(Into::into).collect();
        self
    }

    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }
}

/// Enforce the route policy on one request.
pub async fn restrict(
    State(acl): State<Arc<AccessControl>>,
    mut req: Request,
    next: Next,
) -> Response {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    if acl.policy.classify(&path_and_query) == RouteClass::Public {
        return next.run(req).await;
    }

    let token = extract_token(&req);
    match acl.signer.verify_token(token.as_deref().unwrap_or_default()) {
        Ok(claims) => {
            let is_admin = acl.admin_subjects.contains(&claims.subject_id);
            req.extensions_mut()
                .insert(AuthContext::from_claims(&claims, is_admin));
            next.run(req).await
        }
        Err(reason) => {
            debug!(path = %req.uri().path(), %reason, "session rejected");
            if wants_json(&req) {
                AccessError::Unauthorized.into_response()
            } else {
                let target = format!("/login?return={}", urlencode(&path_and_query));
                Redirect::to(&target).into_response()
            }
        }
    }
}

/// Attach the fixed security header set to every response.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    res
}

/// Pull the session credential from the cookie or the Authorization header.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(cookies) = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
    {
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

/// API requests get JSON errors instead of redirects: anything under /api,
/// or a client that does not accept HTML.
fn wants_json(req: &Request) -> bool {
    if req.uri().path().starts_with("/api") {
        return true;
    }
    !req.headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html") || accept.contains("*/*"))
}

/// Minimal percent-encoding for the login return parameter.
fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
