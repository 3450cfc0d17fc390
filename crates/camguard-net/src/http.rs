//! Self-signed-cert-tolerant HTTP(S) client.
//!
//! Cameras habitually present self-signed or expired certificates;
//! treating TLS errors as hard failures would drop nearly every camera from
//! scope, so this client never validates them. It never raises on a non-2xx
//! status — callers get `(status, headers, body)` uniformly and inspect the
//! status themselves. Only socket/DNS failures raise, as a `NetError`
//! distinct from an HTTP-level outcome.

use crate::error::{NetError, NetResult};
use reqwest::redirect::Policy;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpRequestConfig {
    pub timeout: Duration,
    pub basic_auth: Option<(String, String)>,
    pub headers: HashMap<String, String>,
    pub follow_redirects: bool,
    pub content_type: Option<String>,
}

impl Default for HttpRequestConfig {
    fn default() -> Self {
        HttpRequestConfig {
            timeout: Duration::from_secs(10),
            basic_auth: None,
            headers: HashMap::new(),
            follow_redirects: false,
            content_type: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct HttpClient;

impl HttpClient {
    fn build_client(config: &HttpRequestConfig) -> NetResult<reqwest::Client> {
        let policy = if config.follow_redirects {
            Policy::limited(5)
        } else {
            Policy::none()
        };
        reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.timeout)
            .redirect(policy)
            .build()
            .map_err(|e| NetError::Transport(e.to_string()))
    }

    pub async fn get(url: &str, config: &HttpRequestConfig) -> NetResult<HttpResponse> {
        Self::request("GET", url, None, config).await
    }

    pub async fn request(
        method: &str,
        url: &str,
        body: Option<Vec<u8>>,
        config: &HttpRequestConfig,
    ) -> NetResult<HttpResponse> {
        let client = Self::build_client(config)?;
        let reqwest_method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| NetError::Transport(e.to_string()))?;

        let mut builder = client.request(reqwest_method, url);

        if let Some((user, pass)) = &config.basic_auth {
            builder = builder.basic_auth(user, Some(pass));
        }
        for (k, v) in &config.headers {
            builder = builder.header(k, v);
        }
        if let Some(ct) = &config.content_type {
            builder = builder.header("Content-Type", ct);
        }
        if let Some(b) = body {
            builder = builder.body(b);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NetError::Timeout(config.timeout)
            } else {
                NetError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| NetError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_timeout_and_no_redirects() {
        let config = HttpRequestConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.follow_redirects);
    }

    #[test]
    fn response_success_range_is_2xx() {
        let r = HttpResponse {
            status: 204,
            headers: HashMap::new(),
            body: String::new(),
        };
        assert!(r.is_success());
        let r = HttpResponse {
            status: 404,
            headers: HashMap::new(),
            body: String::new(),
        };
        assert!(!r.is_success());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("WWW-Authenticate".to_string(), "Digest realm=\"r\"".to_string());
        let r = HttpResponse {
            status: 401,
            headers,
            body: String::new(),
        };
        assert_eq!(
            r.header("www-authenticate"),
            Some("Digest realm=\"r\"")
        );
    }
}
