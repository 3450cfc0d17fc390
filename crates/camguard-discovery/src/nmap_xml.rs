//! Parses the external port scanner's XML output.
//!
//! The system depends only on `nmaprun > host[].address[@addr]`,
//! `host[].ports[].port[@portid]`, `host[].ports[].port.state[@state]`, and
//! `host[].ports[].port.service[@name|@product|@version]`. Any conforming
//! scanner may be substituted.

use crate::error::{DiscoveryError, DiscoveryOpResult};
use camguard_core::{DiscoveredHost, PortState};
use std::net::IpAddr;

pub fn parse_nmap_xml(xml: &str) -> DiscoveryOpResult<Vec<DiscoveredHost>> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| DiscoveryError::XmlParse(e.to_string()))?;
    let mut hosts = Vec::new();

    for host_node in doc.descendants().filter(|n| n.has_tag_name("host")) {
        let ip: IpAddr = match host_node
            .children()
            .find(|n| n.has_tag_name("address"))
            .and_then(|n| n.attribute("addr"))
            .and_then(|s| s.parse().ok())
        {
            Some(ip) => ip,
            None => continue,
        };

        let ports_node = match host_node.children().find(|n| n.has_tag_name("ports")) {
            Some(n) => n,
            None => continue,
        };

        for port_node in ports_node.children().filter(|n| n.has_tag_name("port")) {
            let port: u16 = match port_node.attribute("portid").and_then(|s| s.parse().ok()) {
                Some(p) => p,
                None => continue,
            };

            let state = port_node
                .children()
                .find(|n| n.has_tag_name("state"))
                .and_then(|n| n.attribute("state"))
                .unwrap_or("");
            if state != "open" {
                continue;
            }

            let service_node = port_node.children().find(|n| n.has_tag_name("service"));
            let service = service_node
                .and_then(|n| n.attribute("name"))
                .unwrap_or("unknown")
                .to_string();
            let product = service_node.and_then(|n| n.attribute("product")).unwrap_or("");
            let version = service_node.and_then(|n| n.attribute("version")).unwrap_or("");
            let banner = match (product.is_empty(), version.is_empty()) {
                (true, _) => String::new(),
                (false, true) => product.to_string(),
                (false, false) => format!("{} {}", product, version),
            };

            hosts.push(DiscoveredHost {
                ip,
                port,
                service,
                banner,
                state: PortState::Open,
            });
        }
    }

    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <nmaprun>
      <host>
        <address addr="192.0.2.10" addrtype="ipv4"/>
        <ports>
          <port protocol="tcp" portid="80">
            <state state="open"/>
            <service name="http" product="GoAhead-Webs" version="2.5"/>
          </port>
          <port protocol="tcp" portid="23">
            <state state="closed"/>
            <service name="telnet"/>
          </port>
        </ports>
      </host>
    </nmaprun>
    "#;

    #[test]
    fn keeps_only_open_ports() {
        let hosts = parse_nmap_xml(SAMPLE).unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].port, 80);
        assert_eq!(hosts[0].service, "http");
        assert_eq!(hosts[0].banner, "GoAhead-Webs 2.5");
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(parse_nmap_xml("<not-xml").is_err());
    }

    #[test]
    fn missing_service_element_defaults_to_unknown() {
        let xml = r#"<nmaprun><host><address addr="10.0.0.1"/><ports>
            <port portid="554"><state state="open"/></port>
        </ports></host></nmaprun>"#;
        let hosts = parse_nmap_xml(xml).unwrap();
        assert_eq!(hosts[0].service, "unknown");
        assert_eq!(hosts[0].banner, "");
    }
}
