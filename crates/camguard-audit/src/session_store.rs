//! `session.json`: a single JSON document reflecting the current
//! `SessionMetrics`.
//!
//! Updated via reload-then-rewrite under mutex: acquire the session mutex,
//! read the current file, mutate in memory, write to a temporary sibling,
//! rename over the original. On rename failure (e.g. filesystems that lock
//! target files), fall back to copy-then-delete. Invariant: after any
//! crash, `session.json` is either the pre-update state or the
//! fully-applied post-update state, never torn.

use crate::error::AuditResult;
use camguard_concurrency::FileLockMutex;
use camguard_core::SessionMetrics;
use std::path::{Path, PathBuf};

pub struct SessionStore {
    path: PathBuf,
    mutex: FileLockMutex,
}

impl SessionStore {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        let session_dir: PathBuf = session_dir.into();
        let path = session_dir.join("session.json");
        let lock_path = session_dir.join("session.json.lock");
        SessionStore {
            path,
            mutex: FileLockMutex::new(lock_path),
        }
    }

    /// Creates the initial document. Goes through the same mutex-guarded
    /// write path as `update` so a concurrent reader never sees a partial
    /// first write.
    pub async fn init(&self, metrics: &SessionMetrics) -> AuditResult<()> {
        let guard = self.mutex.lock().await?;
        write_atomically(&self.path, metrics)?;
        drop(guard);
        Ok(())
    }

    /// Read-only, side-effect-free. Safe to call at any time, including
    /// concurrently with an in-progress `update` — the rename-based write
    /// means a reader only ever observes a complete document.
    pub fn read(&self) -> AuditResult<SessionMetrics> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Reload-mutate-flush under the session mutex. The critical section
    /// must stay short relative to the mutex's stale-lock timeout.
    pub async fn update<F>(&self, mutate: F) -> AuditResult<SessionMetrics>
    where
        F: FnOnce(&mut SessionMetrics),
    {
        let guard = self.mutex.lock().await?;
        let mut metrics = self.read()?;
        mutate(&mut metrics);
        write_atomically(&self.path, &metrics)?;
        drop(guard);
        Ok(metrics)
    }
}

fn write_atomically(path: &Path, metrics: &SessionMetrics) -> AuditResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(metrics)?;
    std::fs::write(&tmp_path, json)?;

    if std::fs::rename(&tmp_path, path).is_err() {
        // Rename failed (e.g. a filesystem that locks the target file):
        // fall back to copy-then-delete.
        std::fs::copy(&tmp_path, path)?;
        std::fs::remove_file(&tmp_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camguard_core::{ModuleStatus, SessionStatus};
    use chrono::Utc;

    fn sample_metrics() -> SessionMetrics {
        SessionMetrics::new("sess-1", Utc::now())
    }

    #[tokio::test]
    async fn init_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.init(&sample_metrics()).await.unwrap();
        let back = store.read().unwrap();
        assert_eq!(back.session_id, "sess-1");
        assert_eq!(back.status, SessionStatus::Running);
    }

    #[tokio::test]
    async fn update_mutates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.init(&sample_metrics()).await.unwrap();

        store
            .update(|m| {
                m.modules.push(camguard_core::ModuleMetrics::pending(
                    "discovery",
                    camguard_core::Phase::Discovery,
                ));
            })
            .await
            .unwrap();

        let back = store.read().unwrap();
        assert_eq!(back.modules.len(), 1);
        assert_eq!(back.modules[0].status, ModuleStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_updates_are_serialized_and_none_are_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(SessionStore::new(dir.path()));
        store.init(&sample_metrics()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(move |m| {
                        m.modules.push(camguard_core::ModuleMetrics::pending(
                            format!("module-{}", i),
                            camguard_core::Phase::Testing,
                        ));
                    })
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let back = store.read().unwrap();
        assert_eq!(back.modules.len(), 10);
    }
}
