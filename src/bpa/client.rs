//! BpaClient trait: the only API boundary between the starter and the engine.

use std::fmt;

use async_trait::async_trait;

use super::error::BpaError;
use super::types::{TaskAction, TaskPerformRequest, TaskPerformResponse, WorkflowRequest};

pub type Result<T> = std::result::Result<T, BpaError>;

/// Opaque bearer token forwarded to the engine.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Parse an `Authorization` header value, accepting both `Bearer <jwt>` and
    /// a bare token. Any other scheme (`Basic ..`) yields `None`.
    pub fn from_header_value(value: &str) -> Option<Self> {
        let value = value.trim();
        let token = match value.split_once(' ') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            Some(_) => return None,
            None if value.eq_ignore_ascii_case("bearer") => "",
            None => value,
        };
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

// Tokens never end up in logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[async_trait]
pub trait BpaClient: Send + Sync {
    /// Attempt a transition. `dto` is the caller's original request; the
    /// engine only sees `request`, but decorators hand `dto` to lifecycle events.
    async fn perform(
        &self,
        token: &AuthToken,
        request: &TaskPerformRequest,
        dto: &WorkflowRequest,
    ) -> Result<TaskPerformResponse>;

    /// List the actions available on the process instance (key, reference).
    async fn get_actions(&self, token: &AuthToken, key: &str, reference: &str)
        -> Result<TaskAction>;
}
