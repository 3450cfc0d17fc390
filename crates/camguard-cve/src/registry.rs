//! The CVE check registry: a static, immutable array of
//! `(cveId, vendor, title, severity, ..., probeFn)` records. Every probe is
//! a read-only GET/POST against a fixed path — no destructive payloads, so
//! every check here is safe to run with `safe_mode` on.

use camguard_core::{CveTestResult, FingerprintResult, Severity, Vendor};
use camguard_net::{HttpClient, HttpRequestConfig};
use futures::future::BoxFuture;
use once_cell::sync::Lazy;

pub type ProbeFn = fn(FingerprintResult) -> BoxFuture<'static, CveTestResult>;

pub struct CveCheck {
    pub cve_id: &'static str,
    /// `None` means the check runs against every vendor.
    pub vendor: Option<Vendor>,
    pub title: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub affected_models: &'static [&'static str],
    pub affected_firmware: &'static [&'static str],
    pub category: &'static str,
    /// Every check currently in the registry is read-only, but the field
    /// exists so a future destructive check has somewhere to declare itself
    /// and be excluded when `safe_mode` is on.
    pub destructive: bool,
    pub probe: ProbeFn,
}

fn not_vulnerable(fp: &FingerprintResult, check: &CveCheck, evidence: impl Into<String>) -> CveTestResult {
    CveTestResult {
        cve_id: check.cve_id.to_string(),
        ip: fp.ip,
        port: fp.port,
        vendor: fp.vendor,
        title: check.title.to_string(),
        severity: check.severity,
        vulnerable: false,
        evidence: evidence.into(),
        proof_of_concept: String::new(),
        remediation: String::new(),
    }
}

fn vulnerable(
    fp: &FingerprintResult,
    check: &CveCheck,
    evidence: impl Into<String>,
    poc: impl Into<String>,
    remediation: impl Into<String>,
) -> CveTestResult {
    CveTestResult {
        cve_id: check.cve_id.to_string(),
        ip: fp.ip,
        port: fp.port,
        vendor: fp.vendor,
        title: check.title.to_string(),
        severity: check.severity,
        vulnerable: true,
        evidence: evidence.into(),
        proof_of_concept: poc.into(),
        remediation: remediation.into(),
    }
}

fn hikvision_config_disclosure(fp: FingerprintResult) -> BoxFuture<'static, CveTestResult> {
    Box::pin(async move {
        let check = &CVE_REGISTRY[0];
        let scheme = if fp.port == 443 { "https" } else { "http" };
        let url = format!(
            "{}://{}:{}/System/configurationFile?auth=YWRtaW46MTEK",
            scheme, fp.ip, fp.port
        );
        match HttpClient::get(&url, &HttpRequestConfig::default()).await {
            Ok(resp) if resp.status == 200 && resp.body.len() > 200 => vulnerable(
                &fp,
                check,
                format!("unauthenticated GET returned {} bytes of configuration", resp.body.len()),
                format!("GET {}", url),
                "Upgrade firmware past the vendor's 2017 security advisory; disable the legacy auth bypass endpoint.",
            ),
            Ok(resp) => not_vulnerable(&fp, check, format!("endpoint returned status {}", resp.status)),
            Err(e) => not_vulnerable(&fp, check, format!("probe failed: {}", e)),
        }
    })
}

fn hikvision_command_injection_banner_check(fp: FingerprintResult) -> BoxFuture<'static, CveTestResult> {
    Box::pin(async move {
        let check = &CVE_REGISTRY[1];
        let vulnerable_firmware = check
            .affected_firmware
            .iter()
            .any(|v| fp.firmware.as_deref().map(|f| f.contains(v)).unwrap_or(false));
        if vulnerable_firmware {
            vulnerable(
                &fp,
                check,
                format!("firmware {:?} matches a known-vulnerable range", fp.firmware),
                "firmware-version match only; no active exploitation attempted",
                "Upgrade to a firmware release that postdates the advisory.",
            )
        } else {
            not_vulnerable(&fp, check, "firmware version not in known-vulnerable range or unknown")
        }
    })
}

fn dahua_auth_bypass_nonce_disclosure(fp: FingerprintResult) -> BoxFuture<'static, CveTestResult> {
    Box::pin(async move {
        let check = &CVE_REGISTRY[2];
        let url = format!("http://{}:{}/RPC2_Login", fp.ip, fp.port);
        let body = br#"{"method":"global.login","params":{"userName":"admin","password":"","clientType":"Web3.0"},"id":1}"#;
        match HttpClient::request("POST", &url, Some(body.to_vec()), &HttpRequestConfig::default()).await {
            Ok(resp) if resp.status == 200 && resp.body.contains("\"realm\"") => vulnerable(
                &fp,
                check,
                "login endpoint discloses an authentication nonce/realm before any credential is supplied",
                format!("POST {} with an empty password", url),
                "Apply the vendor patch closing the pre-authentication nonce disclosure.",
            ),
            Ok(resp) => not_vulnerable(&fp, check, format!("endpoint returned status {}", resp.status)),
            Err(e) => not_vulnerable(&fp, check, format!("probe failed: {}", e)),
        }
    })
}

fn axis_unauthenticated_param_disclosure(fp: FingerprintResult) -> BoxFuture<'static, CveTestResult> {
    Box::pin(async move {
        let check = &CVE_REGISTRY[3];
        let url = format!(
            "http://{}:{}/axis-cgi/param.cgi?action=list&group=root.Network",
            fp.ip, fp.port
        );
        match HttpClient::get(&url, &HttpRequestConfig::default()).await {
            Ok(resp) if resp.status == 200 && resp.body.contains("root.Network") => vulnerable(
                &fp,
                check,
                "network configuration parameters readable without authentication",
                format!("GET {}", url),
                "Require authentication on the param.cgi listing endpoints.",
            ),
            Ok(resp) => not_vulnerable(&fp, check, format!("endpoint returned status {}", resp.status)),
            Err(e) => not_vulnerable(&fp, check, format!("probe failed: {}", e)),
        }
    })
}

fn generic_onvif_unauthenticated_datetime_disclosure(fp: FingerprintResult) -> BoxFuture<'static, CveTestResult> {
    Box::pin(async move {
        let check = &CVE_REGISTRY[4];
        if !fp.onvif_responded {
            return not_vulnerable(&fp, check, "ONVIF service did not respond during fingerprinting");
        }
        let url = format!("http://{}:{}/onvif/device_service", fp.ip, fp.port);
        let envelope = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope" xmlns:tds="http://www.onvif.org/ver10/device/wsdl">
  <soap:Body><tds:GetSystemDateAndTime/></soap:Body>
</soap:Envelope>"#;
        let config = HttpRequestConfig {
            content_type: Some("application/soap+xml".to_string()),
            ..HttpRequestConfig::default()
        };
        match HttpClient::request("POST", &url, Some(envelope.as_bytes().to_vec()), &config).await {
            Ok(resp) if resp.status == 200 && resp.body.to_lowercase().contains("getsystemdateandtimeresponse") => {
                vulnerable(
                    &fp,
                    check,
                    "ONVIF GetSystemDateAndTime answered without authentication",
                    format!("POST {}", url),
                    "Require WS-UsernameToken authentication on ONVIF device service calls.",
                )
            }
            Ok(resp) => not_vulnerable(&fp, check, format!("endpoint returned status {}", resp.status)),
            Err(e) => not_vulnerable(&fp, check, format!("probe failed: {}", e)),
        }
    })
}

pub static CVE_REGISTRY: Lazy<Vec<CveCheck>> = Lazy::new(|| {
    vec![
        CveCheck {
            cve_id: "CVE-2017-7921",
            vendor: Some(Vendor::Hikvision),
            title: "Hikvision authentication bypass via crafted URI",
            severity: Severity::Critical,
            description: "Certain Hikvision IP camera firmware accepts a hardcoded auth token on configuration-export endpoints, allowing unauthenticated retrieval of device configuration.",
            affected_models: &["DS-2CD", "DS-2CD2xx2F"],
            affected_firmware: &["V5.2.0", "V5.3.0", "V5.3.3"],
            category: "auth-bypass",
            destructive: false,
            probe: hikvision_config_disclosure,
        },
        CveCheck {
            cve_id: "CVE-2021-36260",
            vendor: Some(Vendor::Hikvision),
            title: "Hikvision command injection via webLanguage",
            severity: Severity::Critical,
            description: "Unauthenticated command injection in the web server component of a broad range of Hikvision devices.",
            affected_models: &["DS-2CD", "DS-2DE"],
            affected_firmware: &["V5.5.0", "V5.5.800", "V5.5.810"],
            category: "command-injection",
            destructive: false,
            probe: hikvision_command_injection_banner_check,
        },
        CveCheck {
            cve_id: "CVE-2021-33044",
            vendor: Some(Vendor::Dahua),
            title: "Dahua authentication bypass via login nonce disclosure",
            severity: Severity::High,
            description: "An attacker-controlled login request to select Dahua devices discloses a pre-authentication nonce usable to bypass the login process.",
            affected_models: &["IPC-HDW", "DH-IPC"],
            affected_firmware: &[],
            category: "auth-bypass",
            destructive: false,
            probe: dahua_auth_bypass_nonce_disclosure,
        },
        CveCheck {
            cve_id: "CVE-2018-10660",
            vendor: Some(Vendor::Axis),
            title: "Axis unauthenticated network parameter disclosure",
            severity: Severity::Medium,
            description: "param.cgi exposes network configuration without authentication on misconfigured Axis devices.",
            affected_models: &["M30", "P13"],
            affected_firmware: &[],
            category: "info-disclosure",
            destructive: false,
            probe: axis_unauthenticated_param_disclosure,
        },
        CveCheck {
            cve_id: "CVE-2020-GENERIC-ONVIF-01",
            vendor: None,
            title: "ONVIF GetSystemDateAndTime unauthenticated disclosure",
            severity: Severity::Low,
            description: "Devices answering ONVIF device-service calls without WS-Security tokens leak system time, aiding reconnaissance.",
            affected_models: &[],
            affected_firmware: &[],
            category: "info-disclosure",
            destructive: false,
            probe: generic_onvif_unauthenticated_datetime_disclosure,
        },
    ]
});

/// Checks applicable to `vendor`: vendor-matched plus every generic check,
/// honoring the category filter and excluding destructive checks when
/// `safe_mode` is on.
pub fn checks_for(vendor: Vendor, categories: &[String], safe_mode: bool) -> Vec<&'static CveCheck> {
    CVE_REGISTRY
        .iter()
        .filter(|c| c.vendor.is_none() || c.vendor == Some(vendor))
        .filter(|c| categories.is_empty() || categories.iter().any(|cat| cat == c.category))
        .filter(|c| !safe_mode || !c.destructive)
        .collect()
}
