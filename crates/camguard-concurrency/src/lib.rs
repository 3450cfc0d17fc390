//! # camguard-concurrency
//!
//! Bounded parallel execution, a token-bucket rate limiter, and a named
//! file-lock mutex — the three concurrency primitives shared by every
//! activity.

pub mod file_lock;
pub mod rate_limiter;
pub mod worker;

pub use file_lock::{FileLockMutex, LockError, LockGuard};
pub use rate_limiter::RateLimiter;
pub use worker::{run_bounded, TaskOutcome};
