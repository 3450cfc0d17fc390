//! Shared data model for the assessment pipeline.
//!
//! Every type here is produced by exactly one component and consumed by the
//! ones downstream of it; see the module docs in each `camguard-*` crate for
//! who owns what. All types are `Serialize`/`Deserialize` because every one
//! of them eventually lands in a `deliverables/*.json` file or `session.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Default camera-relevant port set used when a `TargetSpec` supplies no
/// explicit ports.
pub const DEFAULT_CAMERA_PORTS: &[u16] = &[
    80, 81, 82, 85, 443, 554, 2020, 8080, 8081, 8443, 8554, 8555, 8888, 9000, 10554, 22, 23,
];

/// Either a single host or a CIDR range, paired with an explicit port list.
/// Immutable for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    pub target: TargetAddress,
    /// Empty means "use `DEFAULT_CAMERA_PORTS`".
    pub ports: Vec<u16>,
}

impl TargetSpec {
    pub fn host(addr: IpAddr, ports: Vec<u16>) -> Self {
        TargetSpec {
            target: TargetAddress::Host(addr),
            ports,
        }
    }

    pub fn cidr(cidr: impl Into<String>, ports: Vec<u16>) -> Self {
        TargetSpec {
            target: TargetAddress::Cidr(cidr.into()),
            ports,
        }
    }

    /// The effective port list: the explicit one, or the default set.
    pub fn effective_ports(&self) -> Vec<u16> {
        if self.ports.is_empty() {
            DEFAULT_CAMERA_PORTS.to_vec()
        } else {
            self.ports.clone()
        }
    }

    pub fn is_single_host(&self) -> bool {
        matches!(self.target, TargetAddress::Host(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAddress {
    Host(IpAddr),
    Cidr(String),
}

/// `state` of a discovered host-port pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortState {
    Open,
    Filtered,
}

/// Produced by Discovery, consumed by Fingerprint. Deduplicated by `(ip, port)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredHost {
    pub ip: IpAddr,
    pub port: u16,
    pub service: String,
    pub banner: String,
    pub state: PortState,
}

impl DiscoveredHost {
    pub fn dedup_key(&self) -> (IpAddr, u16) {
        (self.ip, self.port)
    }
}

/// Camera vendors the fingerprinting registry can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Hikvision,
    Dahua,
    Axis,
    Reolink,
    Amcrest,
    Foscam,
    TpLink,
    Uniview,
    Vivotek,
    Hanwha,
    Bosch,
    Unknown,
}

impl Default for Vendor {
    fn default() -> Self {
        Vendor::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    Rtsp,
    Onvif,
    Telnet,
    Ssh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    None,
    Basic,
    Digest,
    Form,
    Bearer,
    Unknown,
}

/// Per-host vendor/model/firmware/auth-type identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintResult {
    pub ip: IpAddr,
    pub port: u16,
    pub vendor: Vendor,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub protocols: Vec<Protocol>,
    pub server_banner: Option<String>,
    pub auth_type: AuthType,
    pub web_ui_responded: bool,
    pub onvif_responded: bool,
    pub headers: HashMap<String, String>,
}

impl FingerprintResult {
    pub fn advertises_rtsp(&self) -> bool {
        self.protocols.contains(&Protocol::Rtsp)
    }

    /// A known RTSP port: preferred as the RTSP owner when several
    /// fingerprint records share an IP.
    pub fn is_rtsp_port(&self) -> bool {
        matches!(self.port, 554 | 8554 | 8555 | 10554)
    }
}

/// `(username, password)`. Passwords may be empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestedProtocol {
    Http,
    Https,
    Rtsp,
    Form,
}

/// Per-attempt credential test outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialTestResult {
    pub ip: IpAddr,
    pub port: u16,
    pub vendor: Vendor,
    pub protocol: TestedProtocol,
    pub credential: Credential,
    pub success: bool,
    pub response_code: Option<u16>,
    pub evidence: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    RtspStream,
    SnapshotEndpoint,
    ConfigDisclosure,
    DirectoryTraversal,
    UnauthenticatedAccess,
    InfoDisclosure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Per-discovered-exposure finding from the protocol fuzzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolFinding {
    pub ip: IpAddr,
    pub port: u16,
    pub finding_type: FindingType,
    pub protocol: Protocol,
    pub path: String,
    pub severity: Severity,
    pub description: String,
    pub evidence: String,
    /// true = the endpoint exists but required auth.
    pub authenticated: bool,
    pub timestamp: DateTime<Utc>,
}

/// Per-CVE-check outcome for one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CveTestResult {
    pub cve_id: String,
    pub ip: IpAddr,
    pub port: u16,
    pub vendor: Vendor,
    pub title: String,
    pub severity: Severity,
    pub vulnerable: bool,
    pub evidence: String,
    pub proof_of_concept: String,
    pub remediation: String,
}

/// Aggregated CVE module output for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CveModuleResult {
    pub results: Vec<CveTestResult>,
    pub hosts_scanned: usize,
    pub checks_run: usize,
    pub vulnerable_count: usize,
    pub duration_ms: u64,
}

impl CveModuleResult {
    pub fn vulnerable_hosts_found(&self) -> bool {
        self.vulnerable_count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Fingerprinting,
    Testing,
    Exploitation,
    Reporting,
}

/// Per-module record embedded in `SessionMetrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleMetrics {
    pub name: String,
    pub phase: Phase,
    pub status: ModuleStatus,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub attempt: u32,
    pub error: Option<String>,
}

impl ModuleMetrics {
    pub fn pending(name: impl Into<String>, phase: Phase) -> Self {
        ModuleMetrics {
            name: name.into(),
            phase,
            status: ModuleStatus::Pending,
            start: None,
            end: None,
            duration_ms: None,
            attempt: 0,
            error: None,
        }
    }

    /// Once `completed` or `failed`, this module metric must not be mutated
    /// again within the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ModuleStatus::Completed | ModuleStatus::Failed)
    }
}

/// Single source of truth for "where is this session", updated after every
/// module transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub modules: Vec<ModuleMetrics>,
    pub summary: SessionSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub hosts_discovered: usize,
    pub hosts_fingerprinted: usize,
    pub credentials_found: usize,
    pub vulnerabilities_found: usize,
    pub findings_found: usize,
}

impl SessionMetrics {
    pub fn new(session_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        SessionMetrics {
            session_id: session_id.into(),
            start_time,
            end_time: None,
            status: SessionStatus::Running,
            modules: Vec::new(),
            summary: SessionSummary::default(),
        }
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut ModuleMetrics> {
        self.modules.iter_mut().find(|m| m.name == name)
    }
}

/// Returned by the workflow's read-only `getProgress` query. Must be free of
/// side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub current_phase: Option<Phase>,
    pub current_module: Option<String>,
    pub completed_modules: Vec<String>,
    pub failed_modules: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Deliverable envelope for `deliverables/discovery_results.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub hosts: Vec<DiscoveredHost>,
    pub targets_scanned: usize,
    pub duration_ms: u64,
}

/// Deliverable envelope for `deliverables/fingerprint_results.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FingerprintModuleResult {
    pub results: Vec<FingerprintResult>,
    pub duration_ms: u64,
}

/// Deliverable envelope for `deliverables/credential_results.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialModuleResult {
    pub attempts: Vec<CredentialTestResult>,
    pub attempts_made: usize,
    pub successful_logins: usize,
    /// Distinct `ip:port` pairs with at least one successful credential.
    pub compromised_hosts: Vec<String>,
    pub duration_ms: u64,
}

/// Deliverable envelope for `deliverables/fuzzer_results.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuzzModuleResult {
    pub findings: Vec<ProtocolFinding>,
    pub hosts_probed: usize,
    pub duration_ms: u64,
}

/// Deliverable envelope for `deliverables/exploitation_results.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExploitationModuleResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub evidence: Vec<String>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_used_when_empty() {
        let spec = TargetSpec::host("10.0.0.1".parse().unwrap(), vec![]);
        assert_eq!(spec.effective_ports(), DEFAULT_CAMERA_PORTS.to_vec());
    }

    #[test]
    fn explicit_ports_override_default() {
        let spec = TargetSpec::host("10.0.0.1".parse().unwrap(), vec![8080]);
        assert_eq!(spec.effective_ports(), vec![8080]);
    }

    #[test]
    fn credential_dedup_key_pairs_username_password() {
        let a = Credential::new("admin", "12345");
        let b = Credential::new("admin", "12345");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn module_metrics_terminal_states() {
        let mut m = ModuleMetrics::pending("discovery", Phase::Discovery);
        assert!(!m.is_terminal());
        m.status = ModuleStatus::Completed;
        assert!(m.is_terminal());
    }

    #[test]
    fn session_metrics_round_trips_through_json() {
        let metrics = SessionMetrics::new("sess-1", Utc::now());
        let json = serde_json::to_string(&metrics).unwrap();
        let back: SessionMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session_id, "sess-1");
        assert_eq!(back.status, metrics.status);
    }
}
