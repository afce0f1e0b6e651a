use thiserror::Error;

/// Failure of a call across the BPA boundary.
#[derive(Debug, Error)]
pub enum BpaError {
    /// The engine has no process instance / task for the requested key.
    #[error("not found")]
    NotFound,

    #[error("remote error ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error("transport: {0}")]
    Transport(String),

    #[error("decode: {0}")]
    Decode(String),

    /// A Before-phase hook refused the transition.
    #[error("blocked: {0}")]
    Blocked(String),
}

impl BpaError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Remote { status, .. } => *status,
            Self::Blocked(_) => 422,
            Self::Transport(_) | Self::Decode(_) => 502,
        }
    }
}
