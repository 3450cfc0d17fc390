//! Fans the four probe families out across fingerprinted hosts (RTSP only
//! against the elected per-IP owner) and assembles `FuzzModuleResult`.

use crate::probes::{probe_admin_debug, probe_config_disclosure, probe_rtsp, probe_snapshot};
use crate::rtsp_owner::elect_owners;
use camguard_concurrency::{run_bounded, TaskOutcome};
use camguard_core::{FingerprintResult, FuzzModuleResult, ProtocolFinding};
use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Instant;
use tracing::warn;

pub struct FuzzModuleConfig {
    pub max_concurrent_hosts: usize,
}

pub async fn run(hosts: &[FingerprintResult], config: &FuzzModuleConfig) -> FuzzModuleResult {
    let start = Instant::now();
    let rtsp_owner_ips: HashSet<IpAddr> = elect_owners(hosts).into_iter().map(|h| h.ip).collect();

    let tasks: Vec<_> = hosts
        .to_vec()
        .into_iter()
        .map(|host| {
            let is_rtsp_owner = rtsp_owner_ips.contains(&host.ip);
            move || async move { Ok::<_, String>(probe_host(host, is_rtsp_owner).await) }
        })
        .collect();

    let outcomes = run_bounded(tasks, config.max_concurrent_hosts.max(1)).await;
    let mut findings: Vec<ProtocolFinding> = Vec::new();
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Fulfilled(host_findings) => findings.extend(host_findings),
            TaskOutcome::Rejected(reason) => warn!(reason, "fuzzer task rejected"),
        }
    }

    FuzzModuleResult {
        findings,
        hosts_probed: hosts.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

async fn probe_host(host: FingerprintResult, is_rtsp_owner: bool) -> Vec<ProtocolFinding> {
    let mut findings = Vec::new();
    if is_rtsp_owner && host.advertises_rtsp() {
        findings.extend(probe_rtsp(&host).await);
    }
    findings.extend(probe_snapshot(&host).await);
    findings.extend(probe_config_disclosure(&host).await);
    findings.extend(probe_admin_debug(&host).await);
    findings
}
