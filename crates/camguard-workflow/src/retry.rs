//! Per-activity retry, heartbeat, and start-to-close timeout.
//!
//! Mirrors `run_bounded`'s closure-per-attempt shape rather than a trait
//! object: each phase has its own input/output type, so there is nothing
//! gained from dyn dispatch here — only a generic retry loop around
//! whatever future the caller hands it.

use camguard_audit::WorkflowLog;
use camguard_core::ActivityErrorKind;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Missing heartbeats past this bound restart the activity. Distinct
    /// from, and much shorter than, `start_to_close_timeout` — it catches an
    /// activity that hangs without ever finishing, long before the
    /// start-to-close bound would.
    pub heartbeat_timeout: Duration,
    pub start_to_close_timeout: Duration,
}

impl Default for RetryPolicy {
    /// Exponential backoff starting at 500 ms; a hung activity is restarted
    /// after ≈60 s of missed heartbeats, well inside the ≈2 h
    /// start-to-close timeout each activity is given overall.
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            heartbeat_timeout: Duration::from_secs(60),
            start_to_close_timeout: Duration::from_secs(2 * 60 * 60),
        }
    }
}

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

/// Runs `op` under `policy`, emitting a heartbeat line to `workflow_log`
/// every `HEARTBEAT_INTERVAL` for as long as the attempt is in flight.
///
/// `op` returns `Err((kind, message))`; non-retryable kinds (per
/// `ActivityErrorKind::is_retryable`) return immediately on first failure.
/// Both a missed-heartbeat restart and a start-to-close timeout are treated
/// as a retryable `TimeoutError`.
pub async fn run_activity<F, Fut, T>(
    name: &str,
    policy: &RetryPolicy,
    workflow_log: &WorkflowLog,
    mut op: F,
) -> Result<T, (ActivityErrorKind, String)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, (ActivityErrorKind, String)>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let outcome = match with_heartbeat(
            name,
            workflow_log,
            policy.heartbeat_timeout,
            policy.start_to_close_timeout,
            op(),
        )
        .await
        {
            Ok(result) => result,
            Err(HeartbeatFailure::MissedHeartbeat) => Err((
                ActivityErrorKind::TimeoutError,
                format!("{} missed its heartbeat for {:?}, restarting", name, policy.heartbeat_timeout),
            )),
            Err(HeartbeatFailure::StartToClose) => Err((
                ActivityErrorKind::TimeoutError,
                format!("{} exceeded its start-to-close timeout", name),
            )),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err((kind, message)) => {
                let exhausted = attempt >= policy.max_attempts;
                if !kind.is_retryable() || exhausted {
                    return Err((kind, message));
                }
                let backoff = policy.base_delay * 2u32.pow(attempt - 1);
                warn!(activity = name, attempt, %message, backoff_ms = backoff.as_millis() as u64, "activity attempt failed, retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

enum HeartbeatFailure {
    MissedHeartbeat,
    StartToClose,
}

/// Races the activity future against two bounds: a watchdog that fires once
/// `heartbeat_timeout` has elapsed since the last heartbeat tick, and the
/// overall `start_to_close` timeout. Whichever fires first wins; the
/// heartbeat ticker task is aborted once the race settles either way.
async fn with_heartbeat<Fut, T>(
    name: &str,
    workflow_log: &WorkflowLog,
    heartbeat_timeout: Duration,
    start_to_close: Duration,
    fut: Fut,
) -> Result<T, HeartbeatFailure>
where
    Fut: Future<Output = T>,
{
    let name = name.to_string();
    let log = workflow_log.clone();
    let last_heartbeat = Arc::new(Mutex::new(Instant::now()));

    let ticker_last_heartbeat = last_heartbeat.clone();
    let ticker_name = name.clone();
    let heartbeat = tokio::spawn(async move {
        let mut ticker = interval(HEARTBEAT_INTERVAL);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            *ticker_last_heartbeat.lock().unwrap() = Instant::now();
            let _ = log.message(&format!("heartbeat activity={}", ticker_name)).await;
        }
    });

    let watchdog = async {
        let mut poll = interval(HEARTBEAT_INTERVAL);
        loop {
            poll.tick().await;
            if last_heartbeat.lock().unwrap().elapsed() >= heartbeat_timeout {
                return;
            }
        }
    };

    let result = tokio::select! {
        biased;
        _ = watchdog => Err(HeartbeatFailure::MissedHeartbeat),
        r = timeout(start_to_close, fut) => r.map_err(|_| HeartbeatFailure::StartToClose),
    };

    heartbeat.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_on_first_attempt_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkflowLog::new(dir.path());
        let calls = Arc::new(AtomicU32::new(0));

        let result = run_activity("discovery", &RetryPolicy::default(), &log, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, (ActivityErrorKind, String)>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_retryable_kinds_until_success() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkflowLog::new(dir.path());
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            heartbeat_timeout: Duration::from_secs(5),
            start_to_close_timeout: Duration::from_secs(5),
        };

        let result = run_activity("fingerprint", &policy, &log, || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err((ActivityErrorKind::NetworkError, "connection reset".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_kinds_fail_on_first_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkflowLog::new(dir.path());
        let calls = Arc::new(AtomicU32::new(0));

        let result = run_activity("discovery", &RetryPolicy::default(), &log, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>((ActivityErrorKind::ConfigurationError, "bad target".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
