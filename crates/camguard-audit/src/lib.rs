//! # camguard-audit
//!
//! Three sinks under one session directory: an append-only per-module event
//! log, a unified human-readable workflow log, and a crash-safe
//! `session.json`.

pub mod deliverable;
pub mod error;
pub mod event_log;
pub mod session_store;
pub mod workflow_log;

pub use deliverable::{deliverable_path, write_deliverable};
pub use error::{AuditError, AuditResult};
pub use event_log::{EventLog, EventRecord};
pub use session_store::SessionStore;
pub use workflow_log::WorkflowLog;
