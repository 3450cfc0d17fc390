use camguard_core::ActivityErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl NetError {
    pub fn kind(&self) -> ActivityErrorKind {
        match self {
            NetError::Transport(_) | NetError::Socket(_) => ActivityErrorKind::NetworkError,
            NetError::Timeout(_) => ActivityErrorKind::TimeoutError,
            NetError::MalformedResponse(_) => ActivityErrorKind::UnknownError,
        }
    }
}

pub type NetResult<T> = Result<T, NetError>;
