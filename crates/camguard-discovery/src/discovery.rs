//! Discovery module: per-target, either trust a small explicit port list,
//! invoke the external scanner, or fall back to a direct TCP-connect scan.

use crate::scanner::PortScanner;
use camguard_core::{DiscoveredHost, DiscoveryResult as DiscoveryDeliverable, PortState, TargetAddress, TargetSpec};
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Targets with at most this many explicit ports skip the external scanner
/// entirely — this keeps targeted tests fast and deterministic.
const SMALL_PORT_LIST_THRESHOLD: usize = 10;

const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

pub struct Discovery<S: PortScanner> {
    scanner: S,
    per_host_scan_timeout: Duration,
}

impl<S: PortScanner> Discovery<S> {
    pub fn new(scanner: S) -> Self {
        Discovery {
            scanner,
            per_host_scan_timeout: Duration::from_secs(120),
        }
    }

    pub async fn run(&self, targets: &[TargetSpec]) -> DiscoveryDeliverable {
        let start = Instant::now();
        let mut by_key: HashMap<(IpAddr, u16), DiscoveredHost> = HashMap::new();

        for target in targets {
            let hosts = self.discover_target(target).await;
            for host in hosts {
                by_key.insert(host.dedup_key(), host);
            }
        }

        DiscoveryDeliverable {
            hosts: by_key.into_values().collect(),
            targets_scanned: targets.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn discover_target(&self, target: &TargetSpec) -> Vec<DiscoveredHost> {
        let ports = target.effective_ports();

        if let TargetAddress::Host(ip) = &target.target {
            if ports.len() <= SMALL_PORT_LIST_THRESHOLD {
                debug!(%ip, "small explicit port list, synthesizing hosts directly");
                return ports
                    .iter()
                    .map(|&port| DiscoveredHost {
                        ip: *ip,
                        port,
                        service: "unknown".to_string(),
                        banner: String::new(),
                        state: PortState::Open,
                    })
                    .collect();
            }
        }

        let target_str = target_to_scanner_arg(target);
        match self
            .scanner
            .scan(&target_str, &ports, self.per_host_scan_timeout)
            .await
        {
            Ok(hosts) if !hosts.is_empty() => hosts,
            Ok(_) | Err(_) => {
                warn!(target = %target_str, "external scan failed or empty");
                if let TargetAddress::Host(ip) = &target.target {
                    self.tcp_connect_fallback(*ip, &ports).await
                } else {
                    // CIDR fallback is explicitly refused.
                    Vec::new()
                }
            }
        }
    }

    async fn tcp_connect_fallback(&self, ip: IpAddr, ports: &[u16]) -> Vec<DiscoveredHost> {
        let mut hosts = Vec::new();
        for &port in ports {
            let addr = (ip, port);
            if timeout(TCP_CONNECT_TIMEOUT, TcpStream::connect(addr))
                .await
                .map(|r| r.is_ok())
                .unwrap_or(false)
            {
                hosts.push(DiscoveredHost {
                    ip,
                    port,
                    service: "unknown".to_string(),
                    banner: String::new(),
                    state: PortState::Open,
                });
            }
        }
        hosts
    }
}

fn target_to_scanner_arg(target: &TargetSpec) -> String {
    match &target.target {
        TargetAddress::Host(ip) => ip.to_string(),
        TargetAddress::Cidr(cidr) => cidr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeScanner {
        result: DiscoveryOpResult<Vec<DiscoveredHost>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PortScanner for FakeScanner {
        async fn scan(
            &self,
            _target: &str,
            _ports: &[u16],
            _timeout: Duration,
        ) -> DiscoveryOpResult<Vec<DiscoveredHost>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(hosts) => Ok(hosts.clone()),
                Err(_) => Err(crate::error::DiscoveryError::ScanFailed("fake failure".into())),
            }
        }
    }

    fn host(ip: &str, port: u16) -> DiscoveredHost {
        DiscoveredHost {
            ip: ip.parse().unwrap(),
            port,
            service: "http".to_string(),
            banner: "test".to_string(),
            state: PortState::Open,
        }
    }

    #[tokio::test]
    async fn small_explicit_port_list_skips_the_scanner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scanner = FakeScanner {
            result: Ok(vec![]),
            calls: calls.clone(),
        };
        let discovery = Discovery::new(scanner);
        let target = TargetSpec::host("192.0.2.10".parse().unwrap(), vec![80, 554]);

        let result = discovery.run(&[target]).await;
        assert_eq!(result.hosts.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scanner_results_are_deduplicated_by_ip_port() {
        let scanner = FakeScanner {
            result: Ok(vec![host("192.0.2.20", 80), host("192.0.2.20", 80)]),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let discovery = Discovery::new(scanner);
        let target = TargetSpec::cidr("192.0.2.0/24", (0..20).collect());

        let result = discovery.run(&[target]).await;
        assert_eq!(result.hosts.len(), 1);
    }

    #[tokio::test]
    async fn cidr_targets_never_use_the_tcp_connect_fallback() {
        let scanner = FakeScanner {
            result: Err(crate::error::DiscoveryError::ScanFailed("down".into())),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let discovery = Discovery::new(scanner);
        let target = TargetSpec::cidr("192.0.2.0/24", (0..20).collect());

        let result = discovery.run(&[target]).await;
        assert!(result.hosts.is_empty());
    }
}
