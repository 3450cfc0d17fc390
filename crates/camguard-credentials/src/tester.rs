//! Drives the credential list against one fingerprinted host: dual pacing,
//! baseline-differential validation, and the auth-type-specific dispatch.

use crate::baseline::{is_different, Baseline};
use crate::credential_list::build_credential_list;
use crate::form_auth::{try_form_login, try_no_auth_login};
use crate::rtsp_test::{describe_with_credentials, UnauthDescribeCache};
use camguard_concurrency::RateLimiter;
use camguard_core::{AuthType, Credential, CredentialTestResult, FingerprintResult, TestedProtocol, Vendor};
use camguard_fingerprint::vendor_registry;
use camguard_net::{digest, HttpClient, HttpRequestConfig};
use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

const GENERIC_RTSP_PATH: &str = "/live.sdp";
const GENERIC_NONE_LOGIN_ENDPOINTS: &[&str] = &["/login.cgi", "/cgi-bin/login.cgi"];

pub struct CredentialTester<'a> {
    pub rate_limiter: &'a RateLimiter,
    pub rtsp_cache: &'a UnauthDescribeCache,
    pub max_attempts_per_host: u32,
    pub delay: Duration,
    pub defaults_enabled: bool,
    pub custom: &'a [Credential],
}

impl<'a> CredentialTester<'a> {
    pub async fn test_host(&self, fp: &FingerprintResult) -> Vec<CredentialTestResult> {
        let credentials = build_credential_list(fp.vendor, self.defaults_enabled, self.custom);
        let mut results = Vec::new();
        let mut attempts = 0u32;
        let mut succeeded = false;

        let scheme = if fp.port == 443 || fp.port == 8443 { "https" } else { "http" };
        let base_url = format!("{}://{}:{}", scheme, fp.ip, fp.port);

        let baseline = if fp.web_ui_responded && matches!(fp.auth_type, AuthType::Basic) {
            Some(fetch_baseline(&base_url).await)
        } else {
            None
        };

        for credential in &credentials {
            if succeeded || attempts >= self.max_attempts_per_host {
                break;
            }
            attempts += 1;
            self.rate_limiter.acquire().await;

            let outcome = self
                .attempt(fp, &base_url, baseline.as_ref(), credential)
                .await;
            if let Some(result) = outcome {
                succeeded = succeeded || result.success;
                results.push(result);
            }

            if self.delay > Duration::ZERO {
                sleep(self.delay).await;
            }
        }

        if fp.advertises_rtsp() && !succeeded {
            if let Some(result) = self.test_rtsp(fp, &credentials).await {
                results.push(result);
            }
        }

        results
    }

    async fn attempt(
        &self,
        fp: &FingerprintResult,
        base_url: &str,
        baseline: Option<&Baseline>,
        credential: &Credential,
    ) -> Option<CredentialTestResult> {
        match fp.auth_type {
            AuthType::Basic => Some(self.attempt_basic(fp, base_url, baseline.unwrap(), credential).await),
            AuthType::Digest => Some(self.attempt_digest(fp, base_url, credential).await),
            AuthType::Form => Some(self.attempt_form(fp, base_url, credential).await),
            AuthType::None => Some(self.attempt_none(fp, base_url, credential).await),
            AuthType::Bearer | AuthType::Unknown => None,
        }
    }

    async fn attempt_basic(
        &self,
        fp: &FingerprintResult,
        base_url: &str,
        baseline: &Baseline,
        credential: &Credential,
    ) -> CredentialTestResult {
        let config = HttpRequestConfig {
            basic_auth: Some((credential.username.clone(), credential.password.clone())),
            ..HttpRequestConfig::default()
        };
        let url = format!("{}/", base_url);
        let (status, different, evidence) = match HttpClient::get(&url, &config).await {
            Ok(resp) => {
                let different = is_different(baseline, resp.status, &resp.body);
                (Some(resp.status), different, format!("basic auth probe status {}", resp.status))
            }
            Err(e) => (None, false, format!("request failed: {}", e)),
        };
        result(fp, TestedProtocol::Http, credential.clone(), different, status, evidence)
    }

    async fn attempt_digest(
        &self,
        fp: &FingerprintResult,
        base_url: &str,
        credential: &Credential,
    ) -> CredentialTestResult {
        let url = format!("{}/", base_url);
        let challenge_resp = match HttpClient::get(&url, &HttpRequestConfig::default()).await {
            Ok(resp) => resp,
            Err(e) => {
                return result(
                    fp,
                    TestedProtocol::Http,
                    credential.clone(),
                    false,
                    None,
                    format!("challenge request failed: {}", e),
                )
            }
        };

        let baseline = Baseline::reached(challenge_resp.status, challenge_resp.body.clone());
        let challenge_header = challenge_resp
            .header("www-authenticate")
            .and_then(digest::DigestChallenge::parse);

        let Some(challenge) = challenge_header else {
            return result(
                fp,
                TestedProtocol::Http,
                credential.clone(),
                false,
                Some(challenge_resp.status),
                "no digest challenge present".to_string(),
            );
        };

        let cnonce = digest::generate_cnonce();
        let auth_header = digest::compute_authorization(
            &credential.username,
            &credential.password,
            "GET",
            "/",
            &challenge,
            &cnonce,
            "00000001",
            None,
        );
        let mut config = HttpRequestConfig::default();
        config.headers.insert("Authorization".to_string(), auth_header);

        match HttpClient::get(&url, &config).await {
            Ok(resp) => {
                let different = is_different(&baseline, resp.status, &resp.body);
                result(
                    fp,
                    TestedProtocol::Http,
                    credential.clone(),
                    different,
                    Some(resp.status),
                    format!("digest auth probe status {}", resp.status),
                )
            }
            Err(e) => result(
                fp,
                TestedProtocol::Http,
                credential.clone(),
                false,
                None,
                format!("request failed: {}", e),
            ),
        }
    }

    async fn attempt_form(
        &self,
        fp: &FingerprintResult,
        base_url: &str,
        credential: &Credential,
    ) -> CredentialTestResult {
        match try_form_login(base_url, &credential.username, &credential.password).await {
            Some((endpoint, status, _)) => result(
                fp,
                TestedProtocol::Form,
                credential.clone(),
                true,
                Some(status),
                format!("form login succeeded at {}", endpoint),
            ),
            None => result(fp, TestedProtocol::Form, credential.clone(), false, None, "no form endpoint accepted credentials".to_string()),
        }
    }

    async fn attempt_none(
        &self,
        fp: &FingerprintResult,
        base_url: &str,
        credential: &Credential,
    ) -> CredentialTestResult {
        let endpoints: Vec<&str> = vendor_registry::signature_for(fp.vendor)
            .map(|sig| sig.login_endpoints.to_vec())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| GENERIC_NONE_LOGIN_ENDPOINTS.to_vec());

        match try_no_auth_login(base_url, &endpoints, &credential.username, &credential.password).await {
            Some((endpoint, status, _)) => result(
                fp,
                TestedProtocol::Http,
                credential.clone(),
                true,
                Some(status),
                format!("explicit success marker at {}", endpoint),
            ),
            None => result(fp, TestedProtocol::Http, credential.clone(), false, None, "no explicit success marker returned".to_string()),
        }
    }

    async fn test_rtsp(&self, fp: &FingerprintResult, credentials: &[Credential]) -> Option<CredentialTestResult> {
        let path = vendor_registry::signature_for(fp.vendor)
            .and_then(|sig| sig.rtsp_paths.first().copied())
            .unwrap_or(GENERIC_RTSP_PATH);

        if self.rtsp_cache.unauthenticated_succeeds(fp.ip, fp.port, path).await {
            return Some(CredentialTestResult {
                ip: fp.ip,
                port: fp.port,
                vendor: fp.vendor,
                protocol: TestedProtocol::Rtsp,
                credential: Credential::new("", ""),
                success: false,
                response_code: Some(200),
                evidence: "stream unauthenticated; credential test not applicable".to_string(),
                timestamp: Utc::now(),
            });
        }

        for credential in credentials {
            self.rate_limiter.acquire().await;
            if describe_with_credentials(fp.ip, fp.port, path, &credential.username, &credential.password).await {
                return Some(CredentialTestResult {
                    ip: fp.ip,
                    port: fp.port,
                    vendor: fp.vendor,
                    protocol: TestedProtocol::Rtsp,
                    credential: credential.clone(),
                    success: true,
                    response_code: Some(200),
                    evidence: format!("credentialed DESCRIBE succeeded on {}", path),
                    timestamp: Utc::now(),
                });
            }
            if self.delay > Duration::ZERO {
                sleep(self.delay).await;
            }
        }
        None
    }
}

async fn fetch_baseline(base_url: &str) -> Baseline {
    let url = format!("{}/", base_url);
    match HttpClient::get(&url, &HttpRequestConfig::default()).await {
        Ok(resp) => {
            debug!(%url, status = resp.status, "captured baseline");
            Baseline::reached(resp.status, resp.body)
        }
        Err(_) => Baseline::unreachable(),
    }
}

fn result(
    fp: &FingerprintResult,
    protocol: TestedProtocol,
    credential: Credential,
    success: bool,
    response_code: Option<u16>,
    evidence: String,
) -> CredentialTestResult {
    CredentialTestResult {
        ip: fp.ip,
        port: fp.port,
        vendor: fp.vendor,
        protocol,
        credential,
        success,
        response_code,
        evidence,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camguard_core::Protocol;
    use std::collections::HashMap;

    fn fp(auth_type: AuthType, web_ui_responded: bool) -> FingerprintResult {
        FingerprintResult {
            ip: "192.0.2.5".parse().unwrap(),
            port: 80,
            vendor: Vendor::Unknown,
            model: None,
            firmware: None,
            protocols: vec![Protocol::Http],
            server_banner: None,
            auth_type,
            web_ui_responded,
            onvif_responded: false,
            headers: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn unknown_auth_type_is_skipped_without_network_access() {
        let rate_limiter = RateLimiter::new(100);
        let cache = UnauthDescribeCache::new();
        let tester = CredentialTester {
            rate_limiter: &rate_limiter,
            rtsp_cache: &cache,
            max_attempts_per_host: 5,
            delay: Duration::ZERO,
            defaults_enabled: true,
            custom: &[],
        };
        let target = fp(AuthType::Unknown, true);
        let results = tester.test_host(&target).await;
        assert!(results.is_empty());
    }
}
