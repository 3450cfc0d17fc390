//! Fans the per-host pipeline out across a bounded worker pool and collects
//! the deliverable envelope.

use crate::fingerprint::fingerprint_host;
use camguard_core::{DiscoveredHost, FingerprintModuleResult};
use camguard_concurrency::{run_bounded, TaskOutcome};
use std::time::Instant;
use tracing::warn;

pub async fn run(hosts: &[DiscoveredHost], max_concurrent: usize) -> FingerprintModuleResult {
    let start = Instant::now();
    let tasks: Vec<_> = hosts
        .to_vec()
        .into_iter()
        .map(|host| move || async move { fingerprint_host(&host).await.map_err(|e| e.to_string()) })
        .collect();

    let outcomes = run_bounded(tasks, max_concurrent.max(1)).await;
    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Fulfilled(result) => results.push(result),
            TaskOutcome::Rejected(reason) => warn!(reason, "fingerprint task rejected"),
        }
    }

    FingerprintModuleResult {
        results,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
