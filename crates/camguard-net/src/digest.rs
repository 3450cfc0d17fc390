//! RFC 2617 HTTP Digest authentication.
//!
//! Computes the `Authorization: Digest ...` header value for a challenge
//! parsed out of a `WWW-Authenticate` response header. Supports the
//! `md5-sess` algorithm variant and both `qop=auth`/`qop=auth-int` as well as
//! the legacy no-`qop` form.

use rand::Rng;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    Auth,
    AuthInt,
}

impl fmt::Display for Qop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qop::Auth => write!(f, "auth"),
            Qop::AuthInt => write!(f, "auth-int"),
        }
    }
}

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub qop: Vec<Qop>,
    pub md5_sess: bool,
}

impl DigestChallenge {
    /// Parses a `WWW-Authenticate` header value. Tolerates both quoted and
    /// unquoted parameter values and comma-separated attribute lists, and
    /// is case-insensitive about the leading `Digest` scheme token.
    pub fn parse(header_value: &str) -> Option<DigestChallenge> {
        let trimmed = header_value.trim();
        let rest = trimmed
            .strip_prefix("Digest")
            .or_else(|| trimmed.strip_prefix("digest"))?
            .trim_start();

        let params = parse_params(rest);

        let realm = params.get("realm").cloned().unwrap_or_default();
        let nonce = params.get("nonce").cloned().unwrap_or_default();
        let opaque = params.get("opaque").cloned();
        let algorithm = params.get("algorithm").cloned().unwrap_or_default();
        let md5_sess = algorithm.eq_ignore_ascii_case("md5-sess");

        let qop = params
            .get("qop")
            .map(|raw| {
                raw.split(',')
                    .filter_map(|tok| match tok.trim() {
                        "auth" => Some(Qop::Auth),
                        "auth-int" => Some(Qop::AuthInt),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if nonce.is_empty() {
            return None;
        }

        Some(DigestChallenge {
            realm,
            nonce,
            opaque,
            qop,
            md5_sess,
        })
    }
}

/// Splits a comma-separated `key=value` attribute list, handling quoted
/// values that may themselves contain commas.
fn parse_params(s: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i] == b',' || bytes[i] == b' ') {
            i += 1;
        }
        let key_start = i;
        while i < bytes.len() && bytes[i] != b'=' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let key = s[key_start..i].trim().to_ascii_lowercase();
        i += 1; // skip '='

        let value;
        if i < bytes.len() && bytes[i] == b'"' {
            i += 1;
            let val_start = i;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            value = s[val_start..i].to_string();
            i += 1; // skip closing quote
        } else {
            let val_start = i;
            while i < bytes.len() && bytes[i] != b',' {
                i += 1;
            }
            value = s[val_start..i].trim().to_string();
        }

        if !key.is_empty() {
            params.insert(key, value);
        }
    }
    params
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

pub fn generate_cnonce() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 8] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Computes the `Authorization: Digest ...` header value per RFC 2617.
#[allow(clippy::too_many_arguments)]
pub fn compute_authorization(
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
    challenge: &DigestChallenge,
    cnonce: &str,
    nc: &str,
    entity_body: Option<&[u8]>,
) -> String {
    let ha1_base = md5_hex(&format!("{}:{}:{}", username, challenge.realm, password));
    let ha1 = if challenge.md5_sess {
        md5_hex(&format!("{}:{}:{}", ha1_base, challenge.nonce, cnonce))
    } else {
        ha1_base
    };

    let qop = challenge.qop.first().copied();

    let ha2 = match qop {
        Some(Qop::AuthInt) => {
            let body_hash = format!("{:x}", md5::compute(entity_body.unwrap_or(b"")));
            md5_hex(&format!("{}:{}:{}", method, uri, body_hash))
        }
        _ => md5_hex(&format!("{}:{}", method, uri)),
    };

    let response = match qop {
        Some(q) => md5_hex(&format!(
            "{}:{}:{}:{}:{}:{}",
            ha1, challenge.nonce, nc, cnonce, q, ha2
        )),
        None => md5_hex(&format!("{}:{}:{}", ha1, challenge.nonce, ha2)),
    };

    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
        username, challenge.realm, challenge.nonce, uri, response
    );
    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(", opaque=\"{}\"", opaque));
    }
    if challenge.md5_sess {
        header.push_str(", algorithm=MD5-sess");
    }
    if let Some(q) = qop {
        header.push_str(&format!(", qop={}, nc={}, cnonce=\"{}\"", q, nc, cnonce));
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_and_unquoted_params() {
        let header = r#"Digest realm="IP Camera", nonce="abc123", qop="auth,auth-int""#;
        let c = DigestChallenge::parse(header).unwrap();
        assert_eq!(c.realm, "IP Camera");
        assert_eq!(c.nonce, "abc123");
        assert_eq!(c.qop, vec![Qop::Auth, Qop::AuthInt]);
    }

    #[test]
    fn parses_md5_sess_algorithm() {
        let header = r#"Digest realm="r", nonce="n", algorithm=MD5-sess"#;
        let c = DigestChallenge::parse(header).unwrap();
        assert!(c.md5_sess);
    }

    #[test]
    fn rejects_non_digest_scheme() {
        assert!(DigestChallenge::parse("Basic realm=\"x\"").is_none());
    }

    /// Reference computation from RFC 2617 §3.5's worked example, with a
    /// fixed cnonce substituted for the example's `0a4f113b`.
    #[test]
    fn matches_rfc2617_worked_example() {
        let challenge = DigestChallenge {
            realm: "testrealm@host.com".to_string(),
            nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093".to_string(),
            opaque: Some("5ccc069c403ebaf9f0171e9517f40e41".to_string()),
            qop: vec![Qop::Auth],
            md5_sess: false,
        };
        let header = compute_authorization(
            "Mufasa",
            "Circle Of Life",
            "GET",
            "/dir/index.html",
            &challenge,
            "0a4f113b",
            "00000001",
            None,
        );
        assert!(header.contains("response=\"6629fae49393a05397450978507c4ef1\""));
    }

    #[test]
    fn no_qop_falls_back_to_legacy_response() {
        let challenge = DigestChallenge {
            realm: "r".to_string(),
            nonce: "n".to_string(),
            opaque: None,
            qop: vec![],
            md5_sess: false,
        };
        let header = compute_authorization(
            "u", "p", "GET", "/", &challenge, "cn", "00000001", None,
        );
        assert!(!header.contains("qop="));
        assert!(header.contains("response=\""));
    }
}
