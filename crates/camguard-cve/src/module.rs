//! Fans the registry out across fingerprinted hosts and assembles the
//! `CveModuleResult` deliverable.

use crate::registry::checks_for;
use camguard_concurrency::{run_bounded, TaskOutcome};
use camguard_core::{CveModuleResult, CveTestResult, FingerprintResult};
use std::time::Instant;
use tracing::warn;

pub struct CveModuleConfig {
    pub max_concurrent_hosts: usize,
    pub categories: Vec<String>,
    pub safe_mode: bool,
}

pub async fn run(hosts: &[FingerprintResult], config: &CveModuleConfig) -> CveModuleResult {
    let start = Instant::now();

    let tasks: Vec<_> = hosts
        .to_vec()
        .into_iter()
        .map(|host| {
            let categories = config.categories.clone();
            let safe_mode = config.safe_mode;
            move || async move { Ok::<_, String>(run_checks_for_host(host, &categories, safe_mode).await) }
        })
        .collect();

    let outcomes = run_bounded(tasks, config.max_concurrent_hosts.max(1)).await;
    let mut results: Vec<CveTestResult> = Vec::new();
    let mut checks_run = 0usize;
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Fulfilled(host_results) => {
                checks_run += host_results.len();
                results.extend(host_results);
            }
            TaskOutcome::Rejected(reason) => warn!(reason, "cve task rejected"),
        }
    }

    let vulnerable_count = results.iter().filter(|r| r.vulnerable).count();

    CveModuleResult {
        results,
        hosts_scanned: hosts.len(),
        checks_run,
        vulnerable_count,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

async fn run_checks_for_host(host: FingerprintResult, categories: &[String], safe_mode: bool) -> Vec<CveTestResult> {
    let checks = checks_for(host.vendor, categories, safe_mode);
    let mut results = Vec::with_capacity(checks.len());
    for check in checks {
        results.push((check.probe)(host.clone()).await);
    }
    results
}
