//! # camguard-fuzzer
//!
//! Unauthenticated-exposure probing across four endpoint families: RTSP
//! streams (with per-IP owner election), snapshot endpoints, configuration
//! disclosure, and admin/debug endpoints.

pub mod error;
pub mod module;
pub mod paths;
pub mod probes;
pub mod rtsp_owner;

pub use error::{FuzzError, FuzzOpResult};
pub use module::{run, FuzzModuleConfig};
pub use rtsp_owner::elect_owners;
