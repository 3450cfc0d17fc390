//! Per-host vendor/model/firmware/auth-type identification.

use crate::error::FingerprintOpResult;
use crate::vendor_registry::{self, VENDOR_REGISTRY};
use camguard_core::{AuthType, DiscoveredHost, FingerprintResult, Protocol, Vendor};
use camguard_net::{HttpClient, HttpRequestConfig, RtspClient};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const RTSP_PRIMARY_PORTS: &[u16] = &[554, 8554, 8555, 10554];
const HTTPS_PORTS: &[u16] = &[443, 8443];
const RTSP_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const ONVIF_PATH: &str = "/onvif/device_service";

static MODEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:model|deviceType|deviceName)["\s:=]+([^"<,\n\r]+)"#).unwrap()
});
static FIRMWARE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:firmware|firmwareVersion|swVersion)["\s:=]+([^"<,\n\r]+)"#).unwrap()
});
static FORM_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<form.*?(password|login|signin)").unwrap());

const ONVIF_PROBE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope" xmlns:tds="http://www.onvif.org/ver10/device/wsdl">
  <soap:Body><tds:GetDeviceInformation/></soap:Body>
</soap:Envelope>"#;

enum PortClass {
    RtspPrimary,
    Https,
    Http,
}

fn classify(port: u16) -> PortClass {
    if RTSP_PRIMARY_PORTS.contains(&port) {
        PortClass::RtspPrimary
    } else if HTTPS_PORTS.contains(&port) {
        PortClass::Https
    } else {
        PortClass::Http
    }
}

pub async fn fingerprint_host(host: &DiscoveredHost) -> FingerprintOpResult<FingerprintResult> {
    match classify(host.port) {
        PortClass::RtspPrimary => fingerprint_rtsp_primary(host).await,
        PortClass::Https => fingerprint_http(host, true).await,
        PortClass::Http => fingerprint_http(host, false).await,
    }
}

async fn fingerprint_http(host: &DiscoveredHost, tls: bool) -> FingerprintOpResult<FingerprintResult> {
    let scheme = if tls { "https" } else { "http" };
    let root_url = format!("{}://{}:{}/", scheme, host.ip, host.port);
    let config = HttpRequestConfig::default();

    let mut result = FingerprintResult {
        ip: host.ip,
        port: host.port,
        vendor: Vendor::Unknown,
        model: None,
        firmware: None,
        protocols: vec![if tls { Protocol::Https } else { Protocol::Http }],
        server_banner: None,
        auth_type: AuthType::Unknown,
        web_ui_responded: false,
        onvif_responded: false,
        headers: HashMap::new(),
    };

    let response = HttpClient::get(&root_url, &config).await;
    let (status, headers, body) = match &response {
        Ok(r) => (r.status, r.headers.clone(), r.body.clone()),
        Err(e) => {
            debug!(%root_url, error = %e, "root probe failed");
            (0u16, HashMap::new(), String::new())
        }
    };

    if status != 0 {
        result.web_ui_responded = true;
        result.headers = headers.clone();
        result.server_banner = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("server"))
            .map(|(_, v)| v.clone());
        result.auth_type = infer_auth_type(status, &headers, &body);
    }

    let headers_blob = headers
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("\n");
    let mut vendor = vendor_registry::match_by_regex(&headers_blob, &body);

    if vendor.is_none() {
        vendor = probe_known_existence(&root_url, &config).await;
    }

    if let Some(v) = vendor {
        result.vendor = v;
        if let Some(sig) = vendor_registry::signature_for(v) {
            if let Some(endpoint) = sig.device_info_endpoint {
                let url = format!("{}://{}:{}{}", scheme, host.ip, host.port, endpoint);
                if let Ok(resp) = HttpClient::get(&url, &config).await {
                    result.model = extract(&MODEL_PATTERN, &resp.body);
                    result.firmware = extract(&FIRMWARE_PATTERN, &resp.body);
                }
            }
        }
    }

    if probe_onvif(&scheme, host, &config).await {
        result.onvif_responded = true;
        if !result.protocols.contains(&Protocol::Onvif) {
            result.protocols.push(Protocol::Onvif);
        }
    }

    if probe_rtsp_options(554, host).await {
        if !result.protocols.contains(&Protocol::Rtsp) {
            result.protocols.push(Protocol::Rtsp);
        }
    }

    Ok(result)
}

async fn fingerprint_rtsp_primary(host: &DiscoveredHost) -> FingerprintOpResult<FingerprintResult> {
    let mut result = FingerprintResult {
        ip: host.ip,
        port: host.port,
        vendor: Vendor::Unknown,
        model: None,
        firmware: None,
        protocols: vec![Protocol::Rtsp],
        server_banner: None,
        auth_type: AuthType::Unknown,
        web_ui_responded: false,
        onvif_responded: false,
        headers: HashMap::new(),
    };

    let url = format!("rtsp://{}:{}/", host.ip, host.port);
    if let Ok(resp) = RtspClient::options(
        &host.ip.to_string(),
        host.port,
        &url,
        None,
        RTSP_PROBE_TIMEOUT,
    )
    .await
    {
        if let Some(headers) = &resp.headers {
            result.server_banner = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("server"))
                .map(|(_, v)| v.clone());
            let blob = headers
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("\n");
            if let Some(v) = vendor_registry::match_by_regex(&blob, &resp.raw) {
                result.vendor = v;
            }
        }
    }

    Ok(result)
}

fn infer_auth_type(status: u16, headers: &HashMap<String, String>, body: &str) -> AuthType {
    match status {
        401 => {
            let challenge = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("www-authenticate"))
                .map(|(_, v)| v.to_lowercase())
                .unwrap_or_default();
            if challenge.contains("digest") {
                AuthType::Digest
            } else {
                AuthType::Basic
            }
        }
        200 => {
            if FORM_MARKER.is_match(body) {
                AuthType::Form
            } else {
                AuthType::None
            }
        }
        _ => AuthType::Unknown,
    }
}

async fn probe_known_existence(root_url: &str, config: &HttpRequestConfig) -> Option<Vendor> {
    for sig in VENDOR_REGISTRY.iter() {
        for path in sig.probe_paths {
            let url = format!("{}{}", root_url.trim_end_matches('/'), path);
            if let Ok(resp) = HttpClient::get(&url, config).await {
                if resp.status < 400 {
                    return Some(sig.vendor);
                }
            }
        }
    }
    None
}

async fn probe_onvif(scheme: &str, host: &DiscoveredHost, _config: &HttpRequestConfig) -> bool {
    let url = format!("{}://{}:{}{}", scheme, host.ip, host.port, ONVIF_PATH);
    let config = HttpRequestConfig {
        content_type: Some("application/soap+xml".to_string()),
        ..HttpRequestConfig::default()
    };
    match HttpClient::request("POST", &url, Some(ONVIF_PROBE.as_bytes().to_vec()), &config).await {
        Ok(resp) => {
            let lower = resp.body.to_lowercase();
            resp.status == 401
                || lower.contains("onvif")
                || lower.contains("getdeviceinformationresponse")
        }
        Err(_) => false,
    }
}

async fn probe_rtsp_options(port: u16, host: &DiscoveredHost) -> bool {
    if host.port == port {
        return false;
    }
    let url = format!("rtsp://{}:{}/", host.ip, port);
    RtspClient::options(&host.ip.to_string(), port, &url, None, RTSP_PROBE_TIMEOUT)
        .await
        .is_ok()
}

fn extract(pattern: &Regex, body: &str) -> Option<String> {
    pattern
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_rtsp_ports() {
        assert!(matches!(classify(554), PortClass::RtspPrimary));
        assert!(matches!(classify(8555), PortClass::RtspPrimary));
    }

    #[test]
    fn classifies_https_ports() {
        assert!(matches!(classify(443), PortClass::Https));
        assert!(matches!(classify(8443), PortClass::Https));
    }

    #[test]
    fn classifies_everything_else_as_http() {
        assert!(matches!(classify(80), PortClass::Http));
        assert!(matches!(classify(8080), PortClass::Http));
    }

    #[test]
    fn auth_type_401_with_digest_challenge() {
        let mut headers = HashMap::new();
        headers.insert("WWW-Authenticate".to_string(), "Digest realm=\"cam\"".to_string());
        assert_eq!(infer_auth_type(401, &headers, ""), AuthType::Digest);
    }

    #[test]
    fn auth_type_401_with_basic_challenge() {
        let mut headers = HashMap::new();
        headers.insert("WWW-Authenticate".to_string(), "Basic realm=\"cam\"".to_string());
        assert_eq!(infer_auth_type(401, &headers, ""), AuthType::Basic);
    }

    #[test]
    fn auth_type_200_with_login_form_is_form() {
        let body = "<html><form><input type=password></form></html>";
        assert_eq!(infer_auth_type(200, &HashMap::new(), body), AuthType::Form);
    }

    #[test]
    fn auth_type_200_without_form_is_none() {
        let body = "<html><h1>Welcome</h1></html>";
        assert_eq!(infer_auth_type(200, &HashMap::new(), body), AuthType::None);
    }

    #[test]
    fn auth_type_other_status_is_unknown() {
        assert_eq!(infer_auth_type(500, &HashMap::new(), ""), AuthType::Unknown);
    }

    #[test]
    fn model_pattern_extracts_from_typical_device_info_body() {
        let body = r#"{"deviceType":"IPCamera-DS2","firmwareVersion":"V5.6.0"}"#;
        assert_eq!(extract(&MODEL_PATTERN, body), Some("IPCamera-DS2".to_string()));
        assert_eq!(extract(&FIRMWARE_PATTERN, body), Some("V5.6.0".to_string()));
    }
}
