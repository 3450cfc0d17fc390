use camguard_core::ActivityErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("network error: {0}")]
    Net(#[from] camguard_net::NetError),
}

impl CredentialError {
    pub fn kind(&self) -> ActivityErrorKind {
        match self {
            CredentialError::Net(e) => e.kind(),
        }
    }
}

pub type CredentialOpResult<T> = Result<T, CredentialError>;
