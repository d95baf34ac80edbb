//! Static route classification.
//!
//! Two prefix tables, read-only after startup. Matching accepts the exact
//! path, the prefix followed by `/`, or the prefix followed by `?`.
//! Anything unclassified is protected: every public route must be listed
//! explicitly.

/// Classification of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// Static table of public/protected path prefixes.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    public: Vec<String>,
    protected: Vec<String>,
}

impl RoutePolicy {
    pub fn new<P, Q>(public: P, protected: Q) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
    {
        Self {
            public: public.into_iter().map(Into::into).collect(),
            protected: protected.into_iter().map(Into::into).collect(),
        }
    }

    /// The default table for the application: login and health endpoints
    /// public, record and session APIs explicitly protected.
    pub fn standard() -> Self {
        Self::new(
            ["/login", "/logout", "/health", "/assets"],
            ["/api", "/patients", "/visits", "/dashboard"],
        )
    }

    /// Classify a path (with or without its query string).
    ///
    /// Protected prefixes win over public ones, and unlisted paths are
    /// protected by default.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.protected.iter().any(|p| prefix_matches(p, path)) {
            return RouteClass::Protected;
        }
        if self.public.iter().any(|p| prefix_matches(p, path)) {
            return RouteClass::Public;
        }
        RouteClass::Protected
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
}
