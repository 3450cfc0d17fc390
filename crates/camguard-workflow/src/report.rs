//! The report formatter is an explicit non-goal of this pipeline — what is
//! in scope is guaranteeing a report always exists, even for an empty
//! discovery. `MarkdownReportGenerator` is the minimal built-in formatter;
//! a deployment that wants a richer one implements `ReportGenerator`
//! itself.

use async_trait::async_trait;
use camguard_core::{
    CredentialModuleResult, CveModuleResult, DiscoveryResult, ExploitationModuleResult,
    FingerprintModuleResult, FuzzModuleResult, SessionMetrics, Severity,
};

pub struct AssessmentResults<'a> {
    pub session: &'a SessionMetrics,
    pub discovery: &'a DiscoveryResult,
    pub fingerprint: &'a FingerprintModuleResult,
    pub credentials: &'a CredentialModuleResult,
    pub cve: &'a CveModuleResult,
    pub fuzzer: &'a FuzzModuleResult,
    pub exploitation: &'a ExploitationModuleResult,
}

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, results: &AssessmentResults<'_>) -> String;
}

pub struct MarkdownReportGenerator {
    pub severity_threshold: Severity,
    pub include_poc: bool,
}

#[async_trait]
impl ReportGenerator for MarkdownReportGenerator {
    async fn generate(&self, results: &AssessmentResults<'_>) -> String {
        let mut out = String::new();
        out.push_str("# Security Assessment Report\n\n");
        out.push_str(&format!("Session: {}\n\n", results.session.session_id));

        out.push_str("## Summary\n\n");
        out.push_str(&format!("- Hosts discovered: {}\n", results.discovery.hosts.len()));
        out.push_str(&format!("- Hosts fingerprinted: {}\n", results.fingerprint.results.len()));
        out.push_str(&format!(
            "- Successful credential logins: {}\n",
            results.credentials.successful_logins
        ));
        out.push_str(&format!("- Vulnerable CVE findings: {}\n", results.cve.vulnerable_count));
        out.push_str(&format!(
            "- Unauthenticated-exposure findings: {}\n",
            results.fuzzer.findings.len()
        ));
        out.push_str(&format!(
            "- Exploitation attempts: {} ({} succeeded)\n\n",
            results.exploitation.attempted, results.exploitation.succeeded
        ));

        if results.discovery.hosts.is_empty() {
            out.push_str("No hosts were discovered; no further findings to report.\n");
            return out;
        }

        out.push_str("## Credential Findings\n\n");
        for attempt in results.credentials.attempts.iter().filter(|a| a.success) {
            out.push_str(&format!(
                "- {}:{} — {} via {:?} ({})\n",
                attempt.ip, attempt.port, attempt.credential.username, attempt.protocol, attempt.evidence
            ));
        }

        out.push_str("\n## CVE Findings\n\n");
        for check in results.cve.results.iter().filter(|c| c.vulnerable && c.severity >= self.severity_threshold) {
            out.push_str(&format!("- [{}] {}:{} {} ({:?})\n", check.cve_id, check.ip, check.port, check.title, check.severity));
            if self.include_poc && !check.proof_of_concept.is_empty() {
                out.push_str(&format!("  - PoC: {}\n", check.proof_of_concept));
            }
        }

        out.push_str("\n## Unauthenticated Exposure Findings\n\n");
        for finding in results.fuzzer.findings.iter().filter(|f| f.severity >= self.severity_threshold) {
            out.push_str(&format!(
                "- [{:?}] {}:{}{} — {}\n",
                finding.severity, finding.ip, finding.port, finding.path, finding.description
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn empty_results(session: &SessionMetrics) -> (
        DiscoveryResult,
        FingerprintModuleResult,
        CredentialModuleResult,
        CveModuleResult,
        FuzzModuleResult,
        ExploitationModuleResult,
    ) {
        let _ = session;
        Default::default()
    }

    #[tokio::test]
    async fn empty_discovery_still_produces_a_report() {
        let session = SessionMetrics::new("sess-1", Utc::now());
        let (discovery, fingerprint, credentials, cve, fuzzer, exploitation) = empty_results(&session);
        let results = AssessmentResults {
            session: &session,
            discovery: &discovery,
            fingerprint: &fingerprint,
            credentials: &credentials,
            cve: &cve,
            fuzzer: &fuzzer,
            exploitation: &exploitation,
        };

        let generator = MarkdownReportGenerator {
            severity_threshold: Severity::Info,
            include_poc: false,
        };
        let report = generator.generate(&results).await;
        assert!(report.contains("Security Assessment Report"));
        assert!(report.contains("No hosts were discovered"));
    }
}
