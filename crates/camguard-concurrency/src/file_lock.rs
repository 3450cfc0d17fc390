//! Named file-lock mutex, used to serialize writes to the session metrics
//! file across parallel activity processes.
//!
//! Acquisition creates a named lock file with exclusive-create semantics;
//! on collision it polls with a short backoff. After a bounded wait the
//! lock is treated as stale (the holder is assumed dead), the file is
//! force-unlinked, and acquisition retries. The stale-lock timeout assumes
//! bounded critical sections; a pathologically slow disk could trigger
//! spurious reclamation — a write-pid liveness check would catch that case
//! but isn't implemented here.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("io error while acquiring lock: {0}")]
    Io(#[from] std::io::Error),
}

pub struct FileLockMutex {
    path: PathBuf,
    poll_interval: Duration,
    stale_timeout: Duration,
}

impl FileLockMutex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLockMutex {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_timeout: DEFAULT_STALE_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_timing(path: impl Into<PathBuf>, poll_interval: Duration, stale_timeout: Duration) -> Self {
        FileLockMutex {
            path: path.into(),
            poll_interval,
            stale_timeout,
        }
    }

    /// Blocks (asynchronously) until the lock is acquired. The exclusive-create
    /// poll loop is inherently blocking syscalls, so each attempt runs on the
    /// blocking thread pool rather than the async task.
    pub async fn lock(&self) -> Result<LockGuard, LockError> {
        loop {
            let path = self.path.clone();
            let stale_timeout = self.stale_timeout;
            let outcome = tokio::task::spawn_blocking(move || try_acquire_or_reclaim(&path, stale_timeout))
                .await
                .expect("file lock blocking task panicked")?;

            match outcome {
                AcquireOutcome::Acquired => return Ok(LockGuard::new(self.path.clone())),
                AcquireOutcome::ReclaimedStale => continue,
                AcquireOutcome::Busy => sleep(self.poll_interval).await,
            }
        }
    }
}

enum AcquireOutcome {
    Acquired,
    ReclaimedStale,
    Busy,
}

/// Runs entirely on a blocking thread: tries the exclusive create, and on
/// collision checks and reclaims a stale lock in the same blocking call.
fn try_acquire_or_reclaim(path: &Path, stale_timeout: Duration) -> std::io::Result<AcquireOutcome> {
    match try_create(path) {
        Ok(()) => Ok(AcquireOutcome::Acquired),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            if is_stale(path, stale_timeout) {
                let _ = std::fs::remove_file(path);
                Ok(AcquireOutcome::ReclaimedStale)
            } else {
                Ok(AcquireOutcome::Busy)
            }
        }
        Err(e) => Err(e),
    }
}

fn try_create(path: &Path) -> std::io::Result<()> {
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    Ok(())
}

fn is_stale(path: &Path, stale_timeout: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|modified| {
            modified
                .elapsed()
                .map(|age| age >= stale_timeout)
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

/// Releases the lock when dropped, or explicitly via `release()`. Both
/// paths unlink the file and are idempotent.
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    fn new(path: PathBuf) -> Self {
        LockGuard {
            path,
            released: false,
        }
    }

    pub fn release(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
            self.released = true;
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Arc;

    #[tokio::test]
    async fn acquires_uncontended_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.lock");
        let mutex = FileLockMutex::new(&path);
        let guard = mutex.lock().await.unwrap();
        assert!(path.exists());
        drop(guard);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.lock");
        let mutex = FileLockMutex::new(&path);
        let mut guard = mutex.lock().await.unwrap();
        guard.release();
        guard.release();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn reclaims_a_stale_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.lock");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(b"stale").unwrap();
        }
        let old_time = std::time::SystemTime::now() - Duration::from_secs(3600);
        filetime_touch(&path, old_time);

        let mutex =
            FileLockMutex::with_timing(&path, Duration::from_millis(5), Duration::from_millis(50));
        let guard = mutex.lock().await.unwrap();
        assert!(path.exists());
        drop(guard);
    }

    #[tokio::test]
    async fn concurrent_acquirers_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("session.lock"));
        let counter = Arc::new(parking_lot::Mutex::new(0));
        let mut handles = Vec::new();
        for _ in 0..5 {
            let path = path.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let mutex = FileLockMutex::new(&*path);
                let guard = mutex.lock().await.unwrap();
                let mut c = counter.lock();
                *c += 1;
                drop(c);
                drop(guard);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(*counter.lock(), 5);
    }

    /// Sets a file's mtime without pulling in the `filetime` crate for one
    /// test helper.
    fn filetime_touch(path: &Path, time: std::time::SystemTime) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }
}
