use camguard_core::ActivityErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CveError {
    #[error("network error: {0}")]
    Net(#[from] camguard_net::NetError),
}

impl CveError {
    pub fn kind(&self) -> ActivityErrorKind {
        match self {
            CveError::Net(e) => e.kind(),
        }
    }
}

pub type CveOpResult<T> = Result<T, CveError>;
