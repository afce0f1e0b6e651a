use std::num::ParseIntError;

use thiserror::Error;

use crate::bpa::BpaError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("bpa boundary: {0}")]
    Boundary(#[from] BpaError),
}

impl WorkflowError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Boundary(e) => e.http_status(),
        }
    }
}

/// Failure while handling a single lifecycle event. Never retried.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed reference id '{reference}': {source}")]
    MalformedReference {
        reference: String,
        #[source]
        source: ParseIntError,
    },
}
