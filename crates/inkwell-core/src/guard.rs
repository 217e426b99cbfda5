//! Route access guard.
//!
//! The guard holds a static table of `(method, path pattern)` rules. A
//! request matching any rule may only proceed with a signed-in session.
//! Evaluation happens once per request, before routing, so individual
//! handlers never check authentication themselves.

use http::Method;
use regex::Regex;

use crate::error::GuardError;

/// Flash message shown when an anonymous session hits a guarded route.
pub const DENIED_MESSAGE: &str = "You must be signed in to do that.";

/// Rules guarding the document-changing routes. `[^/]+` is one path segment.
const STANDARD_RULES: [(Method, &str); 5] = [
    (Method::GET, r"^/new$"),
    (Method::POST, r"^/create$"),
    (Method::POST, r"^/[^/]+/delete$"),
    (Method::GET, r"^/[^/]+/edit$"),
    (Method::POST, r"^/[^/]+$"),
];

/// A single authentication rule.
#[derive(Debug, Clone)]
pub struct AuthRule {
    method: Method,
    pattern: Regex,
}

impl AuthRule {
    /// Build a rule from a method and an anchored path regex.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidPattern`] if `pattern` does not compile.
    pub fn new(method: Method, pattern: &str) -> Result<Self, GuardError> {
        let pattern = Regex::new(pattern).map_err(|e| GuardError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { method, pattern })
    }

    /// Whether this rule covers the given request line.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.pattern.is_match(path)
    }
}

/// Outcome of checking a session against a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The request may proceed.
    Allowed,
    /// The session is anonymous; the handler must not run.
    Denied,
}

/// The table of guarded routes.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    rules: Vec<AuthRule>,
}

impl RouteGuard {
    /// Create a guard from an explicit rule table.
    #[must_use]
    pub fn new(rules: Vec<AuthRule>) -> Self {
        Self { rules }
    }

    /// The guard for the document routes: creating, editing, updating and
    /// deleting documents all require a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidPattern`] if a built-in pattern fails to
    /// compile.
    pub fn standard() -> Result<Self, GuardError> {
        let rules = STANDARD_RULES
            .into_iter()
            .map(|(method, pattern)| AuthRule::new(method, pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// Whether the request line demands a signed-in session.
    ///
    /// The method must match exactly and the pattern must match the whole
    /// path. Rule order is irrelevant.
    #[must_use]
    pub fn requires_auth(&self, method: &Method, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(method, path))
    }

    /// Decide whether a session with the given signed-in user may proceed
    /// to a guarded route.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn authorize(&self, username: Option<&str>) -> Access {
        if username.is_some() {
            Access::Allowed
        } else {
            Access::Denied
        }
    }
}
