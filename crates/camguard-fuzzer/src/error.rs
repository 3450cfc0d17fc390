use camguard_core::ActivityErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FuzzError {
    #[error("network error: {0}")]
    Net(#[from] camguard_net::NetError),
}

impl FuzzError {
    pub fn kind(&self) -> ActivityErrorKind {
        match self {
            FuzzError::Net(e) => e.kind(),
        }
    }
}

pub type FuzzOpResult<T> = Result<T, FuzzError>;
