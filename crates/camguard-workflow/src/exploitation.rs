//! Exploitation is an explicit non-goal of this pipeline: no payload logic
//! is implemented here. What *is* in scope is the invocation mechanics —
//! shelling out to whatever external exploitation framework the deployment
//! wires in, the same way `camguard_discovery::SubprocessScanner` shells out
//! to an external port scanner rather than reimplementing one.

use async_trait::async_trait;
use camguard_core::{CveTestResult, ExploitationModuleResult};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

#[async_trait]
pub trait ExploitationRunner: Send + Sync {
    async fn run(&self, vulnerable: &[CveTestResult]) -> ExploitationModuleResult;
}

/// Ships no exploitation capability: reports zero attempts regardless of
/// how many vulnerable hosts CVE testing found. The default when no
/// external framework is configured.
pub struct NoopExploitationRunner;

#[async_trait]
impl ExploitationRunner for NoopExploitationRunner {
    async fn run(&self, _vulnerable: &[CveTestResult]) -> ExploitationModuleResult {
        ExploitationModuleResult::default()
    }
}

/// Invokes an external exploitation binary once per vulnerable host, the
/// same subprocess-plus-timeout shape `SubprocessScanner` uses for
/// discovery. The binary is expected to exit 0 on a successful exploit and
/// print one evidence line to stdout; everything about what it actually
/// does is outside this crate.
pub struct SubprocessExploitationRunner {
    binary: String,
    timeout_per_exploit: Duration,
}

impl SubprocessExploitationRunner {
    pub fn new(binary: impl Into<String>, timeout_per_exploit: Duration) -> Self {
        SubprocessExploitationRunner {
            binary: binary.into(),
            timeout_per_exploit,
        }
    }
}

#[async_trait]
impl ExploitationRunner for SubprocessExploitationRunner {
    async fn run(&self, vulnerable: &[CveTestResult]) -> ExploitationModuleResult {
        let start = std::time::Instant::now();
        let mut succeeded = 0usize;
        let mut evidence = Vec::with_capacity(vulnerable.len());

        for target in vulnerable {
            let mut cmd = Command::new(&self.binary);
            cmd.args([
                "--ip",
                &target.ip.to_string(),
                "--port",
                &target.port.to_string(),
                "--cve",
                &target.cve_id,
            ]);

            match timeout(self.timeout_per_exploit, cmd.output()).await {
                Ok(Ok(output)) if output.status.success() => {
                    succeeded += 1;
                    evidence.push(format!(
                        "{} {}:{} exploited: {}",
                        target.cve_id,
                        target.ip,
                        target.port,
                        String::from_utf8_lossy(&output.stdout).trim()
                    ));
                }
                Ok(Ok(output)) => {
                    evidence.push(format!(
                        "{} {}:{} exploit attempt failed: {}",
                        target.cve_id,
                        target.ip,
                        target.port,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ));
                }
                Ok(Err(e)) => {
                    warn!(cve = %target.cve_id, error = %e, "exploitation subprocess could not start");
                }
                Err(_) => {
                    warn!(cve = %target.cve_id, "exploitation subprocess timed out");
                }
            }
        }

        ExploitationModuleResult {
            attempted: vulnerable.len(),
            succeeded,
            evidence,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camguard_core::{Severity, Vendor};
    use std::net::IpAddr;

    fn vulnerable_result() -> CveTestResult {
        CveTestResult {
            cve_id: "CVE-2017-7921".to_string(),
            ip: "192.0.2.1".parse::<IpAddr>().unwrap(),
            port: 80,
            vendor: Vendor::Hikvision,
            title: "auth bypass".to_string(),
            severity: Severity::Critical,
            vulnerable: true,
            evidence: "200 on bypass path".to_string(),
            proof_of_concept: String::new(),
            remediation: "upgrade firmware".to_string(),
        }
    }

    #[tokio::test]
    async fn noop_runner_attempts_nothing() {
        let runner = NoopExploitationRunner;
        let result = runner.run(&[vulnerable_result()]).await;
        assert_eq!(result.attempted, 0);
        assert_eq!(result.succeeded, 0);
    }
}
