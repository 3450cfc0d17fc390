//! The four endpoint-family probes, each producing zero or more
//! `ProtocolFinding`s for one fingerprinted host.

use crate::paths::{merged, ADMIN_DEBUG_PATHS, CONFIG_DISCLOSURE_PATHS, GENERIC_RTSP_PATHS, GENERIC_SNAPSHOT_PATHS};
use camguard_core::{FindingType, FingerprintResult, Protocol, ProtocolFinding, Severity};
use camguard_fingerprint::vendor_registry;
use camguard_net::{HttpClient, HttpRequestConfig, RtspClient};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

const RTSP_TIMEOUT: Duration = Duration::from_secs(3);

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(password|passwd|secret|token|key)").unwrap());

fn finding(
    fp: &FingerprintResult,
    finding_type: FindingType,
    protocol: Protocol,
    path: &str,
    severity: Severity,
    description: impl Into<String>,
    evidence: impl Into<String>,
    authenticated: bool,
) -> ProtocolFinding {
    ProtocolFinding {
        ip: fp.ip,
        port: fp.port,
        finding_type,
        protocol,
        path: path.to_string(),
        severity,
        description: description.into(),
        evidence: evidence.into(),
        authenticated,
        timestamp: Utc::now(),
    }
}

/// Runs only for the elected RTSP owner of an IP.
pub async fn probe_rtsp(fp: &FingerprintResult) -> Vec<ProtocolFinding> {
    let vendor_paths = vendor_registry::signature_for(fp.vendor)
        .map(|sig| sig.rtsp_paths)
        .unwrap_or(&[]);
    let paths = merged(vendor_paths, GENERIC_RTSP_PATHS);

    let mut findings = Vec::new();
    for path in paths {
        let url = format!("rtsp://{}:{}{}", fp.ip, fp.port, path);
        let status = RtspClient::describe(&fp.ip.to_string(), fp.port, &url, None, RTSP_TIMEOUT)
            .await
            .map(|r| r.status_code)
            .unwrap_or(0);

        match status {
            200 => findings.push(finding(
                fp,
                FindingType::RtspStream,
                Protocol::Rtsp,
                path,
                Severity::High,
                "RTSP stream accessible without authentication",
                format!("DESCRIBE {} returned 200", path),
                false,
            )),
            401 => findings.push(finding(
                fp,
                FindingType::RtspStream,
                Protocol::Rtsp,
                path,
                Severity::Info,
                "stream exists, requires auth",
                format!("DESCRIBE {} returned 401", path),
                true,
            )),
            _ => {}
        }
    }
    findings
}

pub async fn probe_snapshot(fp: &FingerprintResult) -> Vec<ProtocolFinding> {
    let vendor_paths = vendor_registry::signature_for(fp.vendor)
        .map(|sig| sig.snapshot_paths)
        .unwrap_or(&[]);
    let paths = merged(vendor_paths, GENERIC_SNAPSHOT_PATHS);
    let scheme = if fp.port == 443 || fp.port == 8443 { "https" } else { "http" };

    let mut findings = Vec::new();
    for path in paths {
        let url = format!("{}://{}:{}{}", scheme, fp.ip, fp.port, path);
        if let Ok(resp) = HttpClient::get(&url, &HttpRequestConfig::default()).await {
            let content_type = resp
                .header("content-type")
                .unwrap_or_default()
                .to_ascii_lowercase();
            if resp.status == 200 && (content_type.starts_with("image/") || content_type.starts_with("octet-stream")) {
                findings.push(finding(
                    fp,
                    FindingType::SnapshotEndpoint,
                    Protocol::Http,
                    path,
                    Severity::Medium,
                    "snapshot image retrievable without authentication",
                    format!("GET {} returned content-type {}", path, content_type),
                    false,
                ));
            }
        }
    }
    findings
}

pub async fn probe_config_disclosure(fp: &FingerprintResult) -> Vec<ProtocolFinding> {
    let scheme = if fp.port == 443 || fp.port == 8443 { "https" } else { "http" };
    let mut findings = Vec::new();

    for path in CONFIG_DISCLOSURE_PATHS {
        let url = format!("{}://{}:{}{}", scheme, fp.ip, fp.port, path);
        if let Ok(resp) = HttpClient::get(&url, &HttpRequestConfig::default()).await {
            let trimmed = resp.body.trim_start();
            let looks_like_html = trimmed.to_ascii_lowercase().starts_with("<!doctype") || trimmed.starts_with('<');
            if resp.status == 200 && resp.body.len() > 20 && !looks_like_html {
                let severity = if SECRET_PATTERN.is_match(&resp.body) {
                    Severity::Critical
                } else {
                    Severity::High
                };
                findings.push(finding(
                    fp,
                    FindingType::ConfigDisclosure,
                    Protocol::Http,
                    path,
                    severity,
                    "configuration data readable without authentication",
                    format!("GET {} returned {} bytes", path, resp.body.len()),
                    false,
                ));
            }
        }
    }
    findings
}

pub async fn probe_admin_debug(fp: &FingerprintResult) -> Vec<ProtocolFinding> {
    let scheme = if fp.port == 443 || fp.port == 8443 { "https" } else { "http" };
    let config = HttpRequestConfig {
        follow_redirects: false,
        ..HttpRequestConfig::default()
    };
    let mut findings = Vec::new();

    for path in ADMIN_DEBUG_PATHS {
        let url = format!("{}://{}:{}{}", scheme, fp.ip, fp.port, path);
        if let Ok(resp) = HttpClient::get(&url, &config).await {
            if resp.status == 200 && resp.body.len() > 50 {
                findings.push(finding(
                    fp,
                    FindingType::UnauthenticatedAccess,
                    Protocol::Http,
                    path,
                    Severity::Medium,
                    "admin/debug endpoint reachable without authentication",
                    format!("GET {} returned {} bytes", path, resp.body.len()),
                    false,
                ));
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_pattern_matches_common_keywords() {
        assert!(SECRET_PATTERN.is_match("wifi_password=hunter2"));
        assert!(SECRET_PATTERN.is_match("api_secret: abc"));
        assert!(!SECRET_PATTERN.is_match("hello world"));
    }
}
