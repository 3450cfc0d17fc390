use camguard_core::ActivityErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("network error: {0}")]
    Net(#[from] camguard_net::NetError),
}

impl FingerprintError {
    pub fn kind(&self) -> ActivityErrorKind {
        match self {
            FingerprintError::Net(e) => e.kind(),
        }
    }
}

pub type FingerprintOpResult<T> = Result<T, FingerprintError>;
