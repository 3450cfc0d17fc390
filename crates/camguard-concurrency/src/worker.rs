//! Bounded parallel execution.
//!
//! Runs at most `cap` tasks concurrently and returns one outcome per input,
//! in the same positions as the inputs, each tagged fulfilled-with-value or
//! rejected-with-reason. No task failure aborts sibling tasks — this is the
//! worker-pool shape design notes call for: a pool of size N draining a
//! shared index counter, modeled here with `buffer_unordered` plus a
//! position tag that gets sorted back into place.

use futures::stream::{self, StreamExt};
use std::future::Future;

#[derive(Debug, Clone)]
pub enum TaskOutcome<T> {
    Fulfilled(T),
    Rejected(String),
}

impl<T> TaskOutcome<T> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, TaskOutcome::Fulfilled(_))
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            TaskOutcome::Fulfilled(v) => Some(v),
            TaskOutcome::Rejected(_) => None,
        }
    }
}

/// Runs `tasks` with at most `cap` in flight at any instant. Each task is a
/// thunk producing a `Result<T, String>`; errors are captured as a rejected
/// outcome rather than propagated, so one failing host can't sink the
/// batch.
pub async fn run_bounded<F, Fut, T>(tasks: Vec<F>, cap: usize) -> Vec<TaskOutcome<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let cap = cap.max(1);
    let indexed = tasks.into_iter().enumerate();

    let mut results: Vec<(usize, TaskOutcome<T>)> = stream::iter(indexed)
        .map(|(idx, task)| async move {
            let outcome = match task().await {
                Ok(v) => TaskOutcome::Fulfilled(v),
                Err(e) => TaskOutcome::Rejected(e),
            };
            (idx, outcome)
        })
        .buffer_unordered(cap)
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, outcome)| outcome).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn results_preserve_input_order() {
        let tasks: Vec<_> = (0..5)
            .map(|i| move || async move { Ok::<_, String>(i) })
            .collect();
        let results = run_bounded(tasks, 2).await;
        let values: Vec<i32> = results.into_iter().map(|o| o.into_value().unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_siblings() {
        let t0 = || async { Ok::<_, String>(10) };
        let t1 = || async { Err::<i32, String>("boom".to_string()) };
        let t2 = || async { Ok::<_, String>(30) };
        let results = run_bounded(vec![t0, t1, t2], 3).await;
        assert!(results[0].is_fulfilled());
        assert!(!results[1].is_fulfilled());
        assert!(results[2].is_fulfilled());
    }

    #[tokio::test]
    async fn never_exceeds_the_concurrency_cap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let cap = 3;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let in_flight = in_flight.clone();
                let max_seen = max_seen.clone();
                move || async move {
                    let cur = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(cur, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                }
            })
            .collect();

        run_bounded(tasks, cap).await;
        assert!(max_seen.load(Ordering::SeqCst) <= cap);
    }
}
