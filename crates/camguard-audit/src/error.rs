use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("lock error: {0}")]
    Lock(#[from] camguard_concurrency::LockError),
}

pub type AuditResult<T> = Result<T, AuditError>;
