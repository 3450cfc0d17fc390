//! # camguard-credentials
//!
//! Baseline-differential credential testing: an ordered, deduplicated
//! credential list per host, dual pacing (rate limiter + per-attempt
//! delay), and auth-type-specific dispatch (Basic/Digest/Form/none/RTSP).

pub mod baseline;
pub mod credential_list;
pub mod error;
pub mod form_auth;
pub mod module;
pub mod tester;

pub use baseline::{is_different, Baseline};
pub use credential_list::build_credential_list;
pub use error::{CredentialError, CredentialOpResult};
pub use module::{run, CredentialModuleConfig};
pub use tester::CredentialTester;
