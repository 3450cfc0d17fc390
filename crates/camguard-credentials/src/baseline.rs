//! Baseline-differential validation: the mechanism that keeps a flood of
//! unauthenticated-200 landing pages from reading as successful logins.

const POST_LOGIN_MARKERS: &[&str] = &[
    "logout",
    "sign-out",
    "dashboard",
    "welcome",
    "session",
    "authenticated",
    "token",
];

#[derive(Debug, Clone)]
pub struct Baseline {
    pub status: Option<u16>,
    pub body: String,
}

impl Baseline {
    pub fn unreachable() -> Self {
        Baseline {
            status: None,
            body: String::new(),
        }
    }

    pub fn reached(status: u16, body: impl Into<String>) -> Self {
        Baseline {
            status: Some(status),
            body: body.into(),
        }
    }
}

/// The seven-rule decision table. `authed` is always reachable — if the
/// credentialed request itself failed at the transport level, the caller
/// doesn't get here.
pub fn is_different(baseline: &Baseline, authed_status: u16, authed_body: &str) -> bool {
    match baseline.status {
        None => (200..400).contains(&authed_status),
        Some(base_status) => {
            if matches!(base_status, 401 | 403) && (200..400).contains(&authed_status) {
                return true;
            }
            if base_status >= 400 && (200..400).contains(&authed_status) {
                return true;
            }
            if base_status == authed_status {
                if baseline.body == authed_body {
                    return false;
                }
                let max_len = baseline.body.len().max(authed_body.len()).max(1);
                let diff = baseline.body.len().abs_diff(authed_body.len());
                let ratio = diff as f64 / max_len as f64;
                if ratio < 0.10 {
                    let lower_authed = authed_body.to_lowercase();
                    let lower_base = baseline.body.to_lowercase();
                    let has_new_marker = POST_LOGIN_MARKERS.iter().any(|marker| {
                        lower_authed.contains(marker) && !lower_base.contains(marker)
                    });
                    return has_new_marker;
                }
                return true;
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_replaced_by_content_is_different() {
        let baseline = Baseline::reached(401, "Unauthorized");
        assert!(is_different(&baseline, 200, "<html>dashboard</html>"));
    }

    #[test]
    fn unreachable_baseline_with_2xx_authed_is_different() {
        let baseline = Baseline::unreachable();
        assert!(is_different(&baseline, 200, "anything"));
    }

    #[test]
    fn identical_status_and_body_is_not_different() {
        let baseline = Baseline::reached(200, "same page");
        assert!(!is_different(&baseline, 200, "same page"));
    }

    #[test]
    fn small_size_delta_with_post_login_marker_is_different() {
        let baseline = Baseline::reached(200, "a".repeat(100));
        let authed = format!("{}welcome", "a".repeat(97));
        assert!(is_different(&baseline, 200, &authed));
    }

    #[test]
    fn small_size_delta_without_new_marker_is_not_different() {
        let baseline = Baseline::reached(200, "a".repeat(100));
        let authed = "a".repeat(103);
        assert!(!is_different(&baseline, 200, &authed));
    }

    #[test]
    fn large_size_delta_is_different() {
        let baseline = Baseline::reached(200, "a".repeat(100));
        let authed = "a".repeat(500);
        assert!(is_different(&baseline, 200, &authed));
    }

    #[test]
    fn baseline_error_authed_success_is_different() {
        let baseline = Baseline::reached(500, "error page");
        assert!(is_different(&baseline, 200, "content"));
    }

    #[test]
    fn mismatched_non_success_statuses_are_not_different() {
        let baseline = Baseline::reached(500, "server error");
        assert!(!is_different(&baseline, 403, "forbidden"));
    }

    #[test]
    fn same_status_large_delta_is_different_even_on_a_failure_status() {
        let baseline = Baseline::reached(404, "not found");
        let authed = "x".repeat(200);
        assert!(is_different(&baseline, 404, &authed));
    }
}
