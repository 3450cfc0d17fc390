//! Fans credential testing out across fingerprinted hosts and assembles the
//! `CredentialModuleResult` deliverable.

use crate::rtsp_test::UnauthDescribeCache;
use crate::tester::CredentialTester;
use camguard_concurrency::{run_bounded, RateLimiter, TaskOutcome};
use camguard_core::{Credential, CredentialModuleResult, FingerprintResult};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::warn;

pub struct CredentialModuleConfig {
    pub max_concurrent_hosts: usize,
    pub requests_per_second: u32,
    pub max_attempts_per_host: u32,
    pub delay: Duration,
    pub defaults_enabled: bool,
    pub custom: Vec<Credential>,
}

pub async fn run(hosts: &[FingerprintResult], config: &CredentialModuleConfig) -> CredentialModuleResult {
    let start = Instant::now();
    let rate_limiter = RateLimiter::new(config.requests_per_second);
    let rtsp_cache = UnauthDescribeCache::new();

    let tasks: Vec<_> = hosts
        .to_vec()
        .into_iter()
        .map(|host| {
            let rate_limiter = &rate_limiter;
            let rtsp_cache = &rtsp_cache;
            let max_attempts_per_host = config.max_attempts_per_host;
            let delay = config.delay;
            let defaults_enabled = config.defaults_enabled;
            let custom = &config.custom;
            move || async move {
                let tester = CredentialTester {
                    rate_limiter,
                    rtsp_cache,
                    max_attempts_per_host,
                    delay,
                    defaults_enabled,
                    custom,
                };
                Ok::<_, String>(tester.test_host(&host).await)
            }
        })
        .collect();

    let outcomes = run_bounded(tasks, config.max_concurrent_hosts.max(1)).await;
    let mut attempts = Vec::new();
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Fulfilled(results) => attempts.extend(results),
            TaskOutcome::Rejected(reason) => warn!(reason, "credential task rejected"),
        }
    }

    let successful_logins = attempts.iter().filter(|a| a.success).count();
    let compromised_hosts: HashSet<String> = attempts
        .iter()
        .filter(|a| a.success)
        .map(|a| format!("{}:{}", a.ip, a.port))
        .collect();

    CredentialModuleResult {
        attempts_made: attempts.len(),
        successful_logins,
        compromised_hosts: compromised_hosts.into_iter().collect(),
        attempts,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
