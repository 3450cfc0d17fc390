//! Shared error taxonomy.
//!
//! The seven kinds below are the policy table from the workflow engine's
//! error handling design: each downstream crate's own error type implements
//! `Into<ActivityErrorKind>` (via `thiserror`'s `#[from]` where practical) so
//! an activity's `?`-propagated error lands in the right retry bucket
//! without hand-written matching at every call site.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityErrorKind {
    ConfigurationError,
    PermissionError,
    InvalidTargetError,
    TimeoutError,
    NetworkError,
    ScanError,
    UnknownError,
}

impl ActivityErrorKind {
    /// Per the error handling policy table: `ConfigurationError`,
    /// `PermissionError`, and `InvalidTargetError` fail the workflow
    /// immediately; `UnknownError` fails the activity without retry (the
    /// workflow may still continue if the activity runs in a parallel
    /// branch); `TimeoutError`, `NetworkError`, and `ScanError` are retried
    /// by the activity's own retry policy.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ActivityErrorKind::TimeoutError
                | ActivityErrorKind::NetworkError
                | ActivityErrorKind::ScanError
        )
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid vendor identifier: {0}")]
    InvalidVendor(String),

    #[error("invalid severity identifier: {0}")]
    InvalidSeverity(String),

    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_timeout_and_scan_errors_are_retryable() {
        let non_retryable = [
            ActivityErrorKind::ConfigurationError,
            ActivityErrorKind::PermissionError,
            ActivityErrorKind::InvalidTargetError,
            ActivityErrorKind::UnknownError,
        ];
        for kind in non_retryable {
            assert!(!kind.is_retryable());
        }
        let retryable = [
            ActivityErrorKind::TimeoutError,
            ActivityErrorKind::NetworkError,
            ActivityErrorKind::ScanError,
        ];
        for kind in retryable {
            assert!(kind.is_retryable());
        }
    }
}
