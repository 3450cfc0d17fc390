//! # camguard-workflow
//!
//! The durable orchestrator: drives Discovery → Fingerprint →
//! (Credential ∥ CVE ∥ Fuzzer) → \[Exploitation\] → Report, with per-activity
//! retry/heartbeat, a short-circuit on empty discovery, and a read-only
//! progress query.

pub mod engine;
pub mod error;
pub mod exploitation;
pub mod report;
pub mod retry;

pub use engine::WorkflowEngine;
pub use error::{WorkflowError, WorkflowResult};
pub use exploitation::{ExploitationRunner, NoopExploitationRunner, SubprocessExploitationRunner};
pub use report::{AssessmentResults, MarkdownReportGenerator, ReportGenerator};
pub use retry::{run_activity, RetryPolicy};
