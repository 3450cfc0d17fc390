//! Form-based and `auth-type=none` credential submission.

use camguard_net::{HttpClient, HttpRequestConfig};
use once_cell::sync::Lazy;
use regex::Regex;

pub const GENERIC_FORM_LOGIN_ENDPOINTS: &[&str] = &["/login", "/login.cgi", "/cgi-bin/login.cgi", "/auth"];

static FORM_ERROR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(error|fail|invalid|wrong|denied)").unwrap());
static FORM_SUCCESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(success|ok|true|token|session)").unwrap());

static NONE_POSITIVE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""success"\s*:\s*true"#,
        r#""statusValue"\s*:\s*200"#,
        r#""result"\s*:\s*true"#,
        r#""authorized"\s*:\s*true"#,
        r"token",
        r"sessionID",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
    .collect()
});

static NONE_NEGATIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(error|fail|invalid|denied|unauthorized)").unwrap());

pub async fn try_form_login(
    base_url: &str,
    username: &str,
    password: &str,
) -> Option<(String, u16, String)> {
    let config = HttpRequestConfig {
        content_type: Some("application/x-www-form-urlencoded".to_string()),
        ..HttpRequestConfig::default()
    };
    let body = format!(
        "userName={}&password={}",
        urlencode(username),
        urlencode(password)
    );

    for endpoint in GENERIC_FORM_LOGIN_ENDPOINTS {
        let url = format!("{}{}", base_url.trim_end_matches('/'), endpoint);
        if let Ok(resp) = HttpClient::request("POST", &url, Some(body.clone().into_bytes()), &config).await {
            let success = resp.status == 200
                && !FORM_ERROR.is_match(&resp.body)
                && (FORM_SUCCESS.is_match(&resp.body) || resp.body.len() > 100);
            if success {
                return Some((endpoint.to_string(), resp.status, resp.body));
            }
        }
    }
    None
}

pub async fn try_no_auth_login(
    base_url: &str,
    login_endpoints: &[&str],
    username: &str,
    password: &str,
) -> Option<(String, u16, String)> {
    let config = HttpRequestConfig {
        content_type: Some("application/x-www-form-urlencoded".to_string()),
        ..HttpRequestConfig::default()
    };
    let body = format!(
        "userName={}&password={}",
        urlencode(username),
        urlencode(password)
    );

    for endpoint in login_endpoints {
        let url = format!("{}{}", base_url.trim_end_matches('/'), endpoint);
        if let Ok(resp) = HttpClient::request("POST", &url, Some(body.clone().into_bytes()), &config).await {
            let has_positive = NONE_POSITIVE.iter().any(|re| re.is_match(&resp.body));
            let has_negative = NONE_NEGATIVE.is_match(&resp.body);
            if has_positive && !has_negative {
                return Some((endpoint.to_string(), resp.status, resp.body));
            }
        }
    }
    None
}

fn urlencode(s: &str) -> String {
    let mut out = String::new();
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_error_regex_matches_common_failure_words() {
        assert!(FORM_ERROR.is_match("Invalid credentials"));
        assert!(!FORM_ERROR.is_match("Welcome back"));
    }

    #[test]
    fn none_positive_markers_require_explicit_success_json() {
        assert!(NONE_POSITIVE.iter().any(|re| re.is_match(r#"{"success":true}"#)));
        assert!(!NONE_POSITIVE.iter().any(|re| re.is_match("plain landing page")));
    }

    #[test]
    fn urlencoding_escapes_reserved_characters() {
        assert_eq!(urlencode("a b&c"), "a%20b%26c");
    }
}
