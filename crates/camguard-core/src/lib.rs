//! # camguard-core
//!
//! Shared data model and error primitives for the camguard assessment
//! pipeline: the structures that flow between Discovery, Fingerprinting,
//! the three parallel testers, Exploitation, and Reporting, plus the
//! activity-scoped cache used by the credential tester's baseline
//! differentiation.

pub mod cache;
pub mod error;
pub mod model;

pub use cache::ScopedCache;
pub use error::{ActivityErrorKind, CoreError, CoreResult};
pub use model::*;
