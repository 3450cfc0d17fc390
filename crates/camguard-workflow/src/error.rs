use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("configuration invalid: {0}")]
    Configuration(#[from] camguard_config::ConfigError),

    #[error("audit sink error: {0}")]
    Audit(#[from] camguard_audit::AuditError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
