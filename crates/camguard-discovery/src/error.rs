use camguard_core::ActivityErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("external scanner failed: {0}")]
    ScanFailed(String),

    #[error("failed to parse scanner output: {0}")]
    XmlParse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiscoveryError {
    pub fn kind(&self) -> ActivityErrorKind {
        match self {
            DiscoveryError::ScanFailed(_) => ActivityErrorKind::ScanError,
            DiscoveryError::XmlParse(_) => ActivityErrorKind::UnknownError,
            DiscoveryError::Io(_) => ActivityErrorKind::NetworkError,
        }
    }
}

pub type DiscoveryOpResult<T> = Result<T, DiscoveryError>;
