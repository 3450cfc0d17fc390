//! The external port-scanner collaborator: invoked as a subprocess with
//! service-version detection, the port list, moderate timing, "open ports
//! only," and XML output to a temp file.

use crate::error::{DiscoveryError, DiscoveryOpResult};
use crate::nmap_xml::parse_nmap_xml;
use async_trait::async_trait;
use camguard_core::DiscoveredHost;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

#[async_trait]
pub trait PortScanner: Send + Sync {
    async fn scan(
        &self,
        target: &str,
        ports: &[u16],
        per_host_timeout: Duration,
    ) -> DiscoveryOpResult<Vec<DiscoveredHost>>;
}

/// Shells out to an external scanner binary (`nmap` by default) with XML
/// output to a temp file, then parses that file.
pub struct SubprocessScanner {
    binary: String,
}

impl SubprocessScanner {
    pub fn new(binary: impl Into<String>) -> Self {
        SubprocessScanner {
            binary: binary.into(),
        }
    }
}

impl Default for SubprocessScanner {
    fn default() -> Self {
        SubprocessScanner::new("nmap")
    }
}

#[async_trait]
impl PortScanner for SubprocessScanner {
    async fn scan(
        &self,
        target: &str,
        ports: &[u16],
        per_host_timeout: Duration,
    ) -> DiscoveryOpResult<Vec<DiscoveredHost>> {
        let out_file = tempfile::NamedTempFile::new()?;
        let out_path = out_file.path().to_path_buf();
        let port_list = ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "-sV",
            "-p",
            &port_list,
            "-T3",
            "--open",
            "-oX",
        ])
        .arg(&out_path)
        .arg(target);

        let output = timeout(per_host_timeout, cmd.output())
            .await
            .map_err(|_| DiscoveryError::ScanFailed(format!("{} timed out", self.binary)))?
            .map_err(|e| DiscoveryError::ScanFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(DiscoveryError::ScanFailed(format!(
                "{} exited with {}",
                self.binary, output.status
            )));
        }

        let xml = tokio::fs::read_to_string(&out_path)
            .await
            .map_err(DiscoveryError::Io)?;
        parse_nmap_xml(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scanner_uses_nmap() {
        let scanner = SubprocessScanner::default();
        assert_eq!(scanner.binary, "nmap");
    }
}
