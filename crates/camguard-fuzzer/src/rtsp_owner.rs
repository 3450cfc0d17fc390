//! Elects exactly one RTSP-owning record per IP, so a camera that advertises
//! RTSP on both its HTTP port (via fingerprint cross-detection) and its
//! native RTSP port isn't probed twice.

use camguard_core::FingerprintResult;
use std::collections::HashMap;
use std::net::IpAddr;

/// Returns the subset of `fp.advertises_rtsp()` hosts that should run the
/// RTSP pass: one per distinct IP, preferring a host whose own port is a
/// known RTSP port.
pub fn elect_owners(hosts: &[FingerprintResult]) -> Vec<&FingerprintResult> {
    let mut by_ip: HashMap<IpAddr, &FingerprintResult> = HashMap::new();

    for host in hosts.iter().filter(|h| h.advertises_rtsp()) {
        by_ip
            .entry(host.ip)
            .and_modify(|current| {
                if !current.is_rtsp_port() && host.is_rtsp_port() {
                    *current = host;
                }
            })
            .or_insert(host);
    }

    by_ip.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camguard_core::{AuthType, Protocol, Vendor};
    use std::collections::HashMap as StdHashMap;

    fn fp(ip: &str, port: u16, rtsp: bool) -> FingerprintResult {
        FingerprintResult {
            ip: ip.parse().unwrap(),
            port,
            vendor: Vendor::Unknown,
            model: None,
            firmware: None,
            protocols: if rtsp { vec![Protocol::Rtsp] } else { vec![Protocol::Http] },
            server_banner: None,
            auth_type: AuthType::Unknown,
            web_ui_responded: true,
            onvif_responded: false,
            headers: StdHashMap::new(),
        }
    }

    #[test]
    fn prefers_the_native_rtsp_port_when_both_advertise() {
        let http_host = fp("192.0.2.1", 80, true);
        let rtsp_host = fp("192.0.2.1", 554, true);
        let owners = elect_owners(&[http_host, rtsp_host]);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].port, 554);
    }

    #[test]
    fn distinct_ips_each_get_an_owner() {
        let a = fp("192.0.2.1", 554, true);
        let b = fp("192.0.2.2", 554, true);
        let owners = elect_owners(&[a, b]);
        assert_eq!(owners.len(), 2);
    }

    #[test]
    fn hosts_not_advertising_rtsp_are_excluded() {
        let a = fp("192.0.2.1", 80, false);
        assert!(elect_owners(&[a]).is_empty());
    }
}
