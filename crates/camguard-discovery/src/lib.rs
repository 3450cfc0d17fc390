//! # camguard-discovery
//!
//! Per-target host/port discovery: a small-explicit-port-list shortcut, the
//! external port scanner subprocess and its XML parser, and a direct
//! TCP-connect fallback.

pub mod discovery;
pub mod error;
pub mod nmap_xml;
pub mod scanner;

pub use discovery::Discovery;
pub use error::{DiscoveryError, DiscoveryOpResult};
pub use nmap_xml::parse_nmap_xml;
pub use scanner::{PortScanner, SubprocessScanner};
