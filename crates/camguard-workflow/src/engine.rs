//! The durable workflow engine: Discovery → Fingerprint →
//! (Credential ∥ CVE ∥ Fuzzer) → \[Exploitation\] → Report.

use crate::exploitation::ExploitationRunner;
use crate::report::{AssessmentResults, ReportGenerator};
use crate::retry::{run_activity, RetryPolicy};
use crate::WorkflowError;
use camguard_audit::{EventLog, SessionStore, WorkflowLog};
use camguard_config::AssessmentConfig;
use camguard_core::{
    ActivityErrorKind, CredentialModuleResult, CveModuleResult, CveTestResult, DiscoveryResult,
    ExploitationModuleResult, FingerprintModuleResult, FuzzModuleResult, ModuleMetrics,
    ModuleStatus, Phase, ProgressSnapshot, SessionMetrics, SessionStatus,
};
use camguard_discovery::{Discovery, PortScanner};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

const DISCOVERY: &str = "discovery";
const FINGERPRINT: &str = "fingerprint";
const CREDENTIAL_TESTER: &str = "credential-tester";
const CVE_SCANNER: &str = "cve-scanner";
const PROTOCOL_FUZZER: &str = "protocol-fuzzer";
const EXPLOITATION: &str = "exploitation";
const REPORT: &str = "report";

pub struct WorkflowEngine<S: PortScanner, X: ExploitationRunner, R: ReportGenerator> {
    config: AssessmentConfig,
    session_dir: PathBuf,
    discovery: Discovery<S>,
    exploitation_runner: X,
    report_generator: R,
    session_store: SessionStore,
    workflow_log: WorkflowLog,
    retry_policy: RetryPolicy,
}

impl<S: PortScanner, X: ExploitationRunner, R: ReportGenerator> WorkflowEngine<S, X, R> {
    pub fn new(
        config: AssessmentConfig,
        session_dir: impl Into<PathBuf>,
        scanner: S,
        exploitation_runner: X,
        report_generator: R,
    ) -> Self {
        let session_dir: PathBuf = session_dir.into();
        WorkflowEngine {
            config,
            discovery: Discovery::new(scanner),
            exploitation_runner,
            report_generator,
            session_store: SessionStore::new(&session_dir),
            workflow_log: WorkflowLog::new(&session_dir),
            retry_policy: RetryPolicy::default(),
            session_dir,
        }
    }

    /// Read-only, side-effect-free progress query. Never mutates `session.json`.
    pub fn get_progress(&self) -> Result<ProgressSnapshot, WorkflowError> {
        let metrics = self.session_store.read()?;
        let current = metrics
            .modules
            .iter()
            .find(|m| m.status == ModuleStatus::Running);
        let completed = metrics
            .modules
            .iter()
            .filter(|m| m.status == ModuleStatus::Completed)
            .map(|m| m.name.clone())
            .collect();
        let failed = metrics
            .modules
            .iter()
            .filter(|m| m.status == ModuleStatus::Failed)
            .map(|m| m.name.clone())
            .collect();
        let elapsed_ms = metrics
            .end_time
            .unwrap_or_else(chrono::Utc::now)
            .signed_duration_since(metrics.start_time)
            .num_milliseconds()
            .max(0) as u64;

        Ok(ProgressSnapshot {
            current_phase: current.map(|m| m.phase),
            current_module: current.map(|m| m.name.clone()),
            completed_modules: completed,
            failed_modules: failed,
            start_time: metrics.start_time,
            elapsed_ms,
        })
    }

    pub async fn run(&self, session_id: impl Into<String>) -> Result<SessionMetrics, WorkflowError> {
        self.config.validate()?;

        let session_id = session_id.into();
        let mut metrics = SessionMetrics::new(session_id, chrono::Utc::now());
        for (name, phase) in [
            (DISCOVERY, Phase::Discovery),
            (FINGERPRINT, Phase::Fingerprinting),
            (CREDENTIAL_TESTER, Phase::Testing),
            (CVE_SCANNER, Phase::Testing),
            (PROTOCOL_FUZZER, Phase::Testing),
            (EXPLOITATION, Phase::Exploitation),
            (REPORT, Phase::Reporting),
        ] {
            metrics.modules.push(ModuleMetrics::pending(name, phase));
        }
        self.session_store.init(&metrics).await?;

        let mut workflow_failed = false;

        // Phase 1: discovery
        let discovery_result = match self.run_discovery().await {
            Ok(result) => result,
            Err((_kind, message)) => {
                self.fail_module(DISCOVERY, &message).await?;
                workflow_failed = true;
                DiscoveryResult::default()
            }
        };
        if !workflow_failed {
            self.complete_module(DISCOVERY, &[("hosts", &discovery_result.hosts.len().to_string())])
                .await?;
        }

        // Phase 1.5: empty-discovery shortcut
        let empty_shortcut = !workflow_failed && discovery_result.hosts.is_empty();
        if empty_shortcut {
            self.workflow_log
                .message("short-circuiting to report: empty discovery")
                .await?;
            for name in [FINGERPRINT, CREDENTIAL_TESTER, CVE_SCANNER, PROTOCOL_FUZZER, EXPLOITATION] {
                self.skip_module(name).await?;
            }
        }

        let run_downstream = !workflow_failed && !empty_shortcut;

        // Phase 2: fingerprint
        let fingerprint_result = if run_downstream {
            match self.run_fingerprint(&discovery_result).await {
                Ok(result) => {
                    self.complete_module(FINGERPRINT, &[("hosts", &result.results.len().to_string())])
                        .await?;
                    Some(result)
                }
                Err((_kind, message)) => {
                    self.fail_module(FINGERPRINT, &message).await?;
                    workflow_failed = true;
                    for name in [CREDENTIAL_TESTER, CVE_SCANNER, PROTOCOL_FUZZER, EXPLOITATION] {
                        self.skip_module(name).await?;
                    }
                    None
                }
            }
        } else {
            None
        };

        // Phase 3: credential ∥ cve ∥ fuzzer, independently isolated
        let (credential_result, cve_result, fuzz_result) =
            if let Some(fp) = fingerprint_result.as_ref().filter(|_| run_downstream) {
                self.run_phase3(fp).await
            } else {
                (None, None, None)
            };

        if fingerprint_result.is_some() {
            match &credential_result {
                Some(r) => {
                    self.complete_module(CREDENTIAL_TESTER, &[("successes", &r.successful_logins.to_string())])
                        .await?
                }
                None => self.fail_module(CREDENTIAL_TESTER, "credential tester panicked").await?,
            }
            match &cve_result {
                Some(r) => {
                    self.complete_module(CVE_SCANNER, &[("vulnerable", &r.vulnerable_count.to_string())])
                        .await?
                }
                None => self.fail_module(CVE_SCANNER, "cve scanner panicked").await?,
            }
            match &fuzz_result {
                Some(r) => {
                    self.complete_module(PROTOCOL_FUZZER, &[("findings", &r.findings.len().to_string())])
                        .await?
                }
                None => self.fail_module(PROTOCOL_FUZZER, "protocol fuzzer panicked").await?,
            }
        }

        // Phase 4: exploitation, conditional
        let exploitation_result = if run_downstream && self.config.exploitation.enabled {
            match cve_result.as_ref().filter(|c| c.vulnerable_hosts_found()) {
                Some(cve) => {
                    let vulnerable: Vec<CveTestResult> =
                        cve.results.iter().filter(|r| r.vulnerable).cloned().collect();
                    let result = self.exploitation_runner.run(&vulnerable).await;
                    self.complete_module(EXPLOITATION, &[("succeeded", &result.succeeded.to_string())])
                        .await?;
                    result
                }
                None => {
                    self.skip_module(EXPLOITATION).await?;
                    ExploitationModuleResult::default()
                }
            }
        } else {
            if run_downstream {
                self.skip_module(EXPLOITATION).await?;
            }
            ExploitationModuleResult::default()
        };

        // Phase 5: reporting, always last, always runs
        let fingerprint_default = FingerprintModuleResult::default();
        let credential_default = CredentialModuleResult::default();
        let cve_default = CveModuleResult::default();
        let fuzz_default = FuzzModuleResult::default();

        let results = AssessmentResults {
            session: &metrics,
            discovery: &discovery_result,
            fingerprint: fingerprint_result.as_ref().unwrap_or(&fingerprint_default),
            credentials: credential_result.as_ref().unwrap_or(&credential_default),
            cve: cve_result.as_ref().unwrap_or(&cve_default),
            fuzzer: fuzz_result.as_ref().unwrap_or(&fuzz_default),
            exploitation: &exploitation_result,
        };
        let report = self.report_generator.generate(&results).await;
        let report_path = self.session_dir.join("deliverables").join("security_assessment_report.md");
        if let Some(parent) = report_path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        tokio::fs::write(&report_path, &report).await.ok();
        self.complete_module(REPORT, &[]).await?;

        let final_status = if workflow_failed {
            SessionStatus::Failed
        } else {
            SessionStatus::Completed
        };
        let final_metrics = self
            .session_store
            .update(|m| {
                m.status = final_status;
                m.end_time = Some(chrono::Utc::now());
                m.summary.hosts_discovered = discovery_result.hosts.len();
                m.summary.hosts_fingerprinted =
                    fingerprint_result.as_ref().map(|r| r.results.len()).unwrap_or(0);
                m.summary.credentials_found =
                    credential_result.as_ref().map(|r| r.successful_logins).unwrap_or(0);
                m.summary.vulnerabilities_found = cve_result.as_ref().map(|r| r.vulnerable_count).unwrap_or(0);
                m.summary.findings_found = fuzz_result.as_ref().map(|r| r.findings.len()).unwrap_or(0);
            })
            .await?;

        Ok(final_metrics)
    }

    async fn run_discovery(&self) -> Result<DiscoveryResult, (ActivityErrorKind, String)> {
        self.workflow_log.phase_transition(DISCOVERY).await.ok();
        self.running_module(DISCOVERY).await.ok();
        let targets = self.config.targets.clone();
        run_activity(DISCOVERY, &self.retry_policy, &self.workflow_log, || {
            let targets = targets.clone();
            async move { Ok(self.discovery.run(&targets).await) }
        })
        .await
    }

    async fn run_fingerprint(
        &self,
        discovery_result: &DiscoveryResult,
    ) -> Result<FingerprintModuleResult, (ActivityErrorKind, String)> {
        self.workflow_log.phase_transition(FINGERPRINT).await.ok();
        self.running_module(FINGERPRINT).await.ok();
        let hosts = discovery_result.hosts.clone();
        let max_concurrent = self.config.rate_limiting.max_concurrent_hosts as usize;
        run_activity(FINGERPRINT, &self.retry_policy, &self.workflow_log, || {
            let hosts = hosts.clone();
            async move { Ok(camguard_fingerprint::module::run(&hosts, max_concurrent).await) }
        })
        .await
    }

    /// Runs the three testers concurrently via `tokio::spawn`, so a panic in
    /// one (an "uncaught error") surfaces as that branch's `None` without
    /// aborting the other two — the isolation boundary the design calls for.
    async fn run_phase3(
        &self,
        fingerprint_result: &FingerprintModuleResult,
    ) -> (
        Option<CredentialModuleResult>,
        Option<CveModuleResult>,
        Option<FuzzModuleResult>,
    ) {
        self.workflow_log.phase_transition("testing").await.ok();
        for name in [CREDENTIAL_TESTER, CVE_SCANNER, PROTOCOL_FUZZER] {
            self.running_module(name).await.ok();
        }

        let hosts = fingerprint_result.results.clone();

        let credential_config = camguard_credentials::CredentialModuleConfig {
            max_concurrent_hosts: self.config.rate_limiting.max_concurrent_hosts as usize,
            requests_per_second: self.config.rate_limiting.requests_per_second,
            max_attempts_per_host: self.config.credentials.max_attempts_per_host,
            delay: Duration::from_millis(self.config.credentials.delay_ms),
            defaults_enabled: self.config.credentials.use_defaults,
            custom: self.config.credentials.custom.clone(),
        };
        let cve_config = camguard_cve::CveModuleConfig {
            max_concurrent_hosts: self.config.rate_limiting.max_concurrent_hosts as usize,
            categories: self.config.cve_testing.categories.clone(),
            safe_mode: self.config.cve_testing.safe_mode,
        };
        let fuzz_config = camguard_fuzzer::FuzzModuleConfig {
            max_concurrent_hosts: self.config.rate_limiting.max_concurrent_hosts as usize,
        };

        run_phase3_branches(hosts, credential_config, cve_config, fuzz_config).await
    }

    async fn running_module(&self, name: &str) -> Result<(), WorkflowError> {
        self.session_store
            .update(|m| {
                if let Some(module) = m.module_mut(name) {
                    module.status = ModuleStatus::Running;
                    module.start = Some(chrono::Utc::now());
                    module.attempt += 1;
                }
            })
            .await?;
        self.workflow_log.module_transition(name, "running", &[]).await.ok();
        info!(module = name, "activity started");
        Ok(())
    }

    async fn complete_module(&self, name: &str, details: &[(&str, &str)]) -> Result<(), WorkflowError> {
        self.session_store
            .update(|m| {
                if let Some(module) = m.module_mut(name) {
                    module.status = ModuleStatus::Completed;
                    let end = chrono::Utc::now();
                    module.duration_ms = module.start.map(|s| (end - s).num_milliseconds().max(0) as u64);
                    module.end = Some(end);
                }
            })
            .await?;
        self.workflow_log.module_transition(name, "completed", details).await.ok();
        Ok(())
    }

    async fn fail_module(&self, name: &str, message: &str) -> Result<(), WorkflowError> {
        self.session_store
            .update(|m| {
                if let Some(module) = m.module_mut(name) {
                    module.status = ModuleStatus::Failed;
                    module.end = Some(chrono::Utc::now());
                    module.error = Some(message.to_string());
                }
            })
            .await?;
        self.workflow_log
            .module_transition(name, "failed", &[("error", message)])
            .await
            .ok();
        Ok(())
    }

    async fn skip_module(&self, name: &str) -> Result<(), WorkflowError> {
        self.session_store
            .update(|m| {
                if let Some(module) = m.module_mut(name) {
                    module.status = ModuleStatus::Skipped;
                }
            })
            .await?;
        self.workflow_log.module_transition(name, "skipped", &[]).await.ok();
        Ok(())
    }

    /// The per-module event log for one attempt, for activities that want
    /// finer-grained audit trail than the workflow log's one-liners.
    pub fn event_log(&self, module: &str, attempt: u32) -> EventLog {
        EventLog::new(EventLog::attempt_path(&self.session_dir, module, attempt))
    }
}

async fn run_phase3_branches(
    hosts: Vec<camguard_core::FingerprintResult>,
    credential_config: camguard_credentials::CredentialModuleConfig,
    cve_config: camguard_cve::CveModuleConfig,
    fuzz_config: camguard_fuzzer::FuzzModuleConfig,
) -> (
    Option<CredentialModuleResult>,
    Option<CveModuleResult>,
    Option<FuzzModuleResult>,
) {
    let credential_hosts = hosts.clone();
    let cve_hosts = hosts.clone();
    let fuzz_hosts = hosts;

    run_phase3_futures(
        async move { camguard_credentials::module::run(&credential_hosts, &credential_config).await },
        async move { camguard_cve::module::run(&cve_hosts, &cve_config).await },
        async move { camguard_fuzzer::run(&fuzz_hosts, &fuzz_config).await },
    )
    .await
}

/// Generic over the three branch futures so tests can substitute a panicking
/// future for one branch without touching the other two.
async fn run_phase3_futures<FC, FV, FZ>(
    credential_fut: FC,
    cve_fut: FV,
    fuzz_fut: FZ,
) -> (
    Option<CredentialModuleResult>,
    Option<CveModuleResult>,
    Option<FuzzModuleResult>,
)
where
    FC: Future<Output = CredentialModuleResult> + Send + 'static,
    FV: Future<Output = CveModuleResult> + Send + 'static,
    FZ: Future<Output = FuzzModuleResult> + Send + 'static,
{
    let (c, v, z) = tokio::join!(
        tokio::spawn(credential_fut),
        tokio::spawn(cve_fut),
        tokio::spawn(fuzz_fut),
    );
    (c.ok(), v.ok(), z.ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camguard_core::Severity;
    use std::net::IpAddr;

    #[tokio::test]
    async fn a_panicking_branch_does_not_abort_the_other_two() {
        let credential_fut = async { CredentialModuleResult::default() };
        let cve_fut = async { panic!("simulated uncaught cve scanner error") };
        let fuzz_fut = async {
            FuzzModuleResult {
                findings: vec![camguard_core::ProtocolFinding {
                    ip: "192.0.2.20".parse::<IpAddr>().unwrap(),
                    port: 554,
                    finding_type: camguard_core::FindingType::RtspStream,
                    protocol: camguard_core::Protocol::Rtsp,
                    path: "/live.sdp".to_string(),
                    severity: Severity::High,
                    description: "stream open".to_string(),
                    evidence: "DESCRIBE returned 200".to_string(),
                    authenticated: false,
                    timestamp: chrono::Utc::now(),
                }],
                hosts_probed: 1,
                duration_ms: 1,
            }
        };

        let (credential, cve, fuzz) = run_phase3_futures(credential_fut, cve_fut, fuzz_fut).await;
        assert!(credential.is_some());
        assert!(cve.is_none());
        assert!(fuzz.is_some());
        assert_eq!(fuzz.unwrap().findings.len(), 1);
    }
}
