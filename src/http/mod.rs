//! Route-level access control.
//!
//! A static route policy classifies paths, middleware enforces session
//! credentials on protected paths and attaches security headers to every
//! response, and `AuthContext` gives downstream handlers the per-subject
//! ownership check.

pub mod authz;
pub mod middleware;
pub mod policy;

pub use authz::{AccessError, AuthContext};
pub use middleware::{restrict, security_headers, AccessControl, SESSION_COOKIE};
pub use policy::{RouteClass, RoutePolicy};
