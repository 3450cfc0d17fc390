//! Unified human-readable `workflow.log`. Append-only; records phase
//! transitions, module status transitions with key=value details, and
//! free-form messages.

use crate::error::AuditResult;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct WorkflowLog {
    path: PathBuf,
}

impl WorkflowLog {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        let mut path: PathBuf = session_dir.into();
        path.push("workflow.log");
        WorkflowLog { path }
    }

    pub async fn phase_transition(&self, phase: &str) -> AuditResult<()> {
        self.append_line(&format!("PHASE phase={}", phase)).await
    }

    pub async fn module_transition(
        &self,
        module: &str,
        status: &str,
        details: &[(&str, &str)],
    ) -> AuditResult<()> {
        let mut line = format!("MODULE module={} status={}", module, status);
        for (k, v) in details {
            line.push_str(&format!(" {}={}", k, v));
        }
        self.append_line(&line).await
    }

    pub async fn message(&self, msg: &str) -> AuditResult<()> {
        self.append_line(&format!("MSG {}", msg)).await
    }

    async fn append_line(&self, body: &str) -> AuditResult<()> {
        let path = self.path.clone();
        let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), body);
        tokio::task::spawn_blocking(move || append_sync(&path, &line))
            .await
            .expect("blocking workflow-log write panicked")
    }
}

fn append_sync(path: &Path, line: &str) -> AuditResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_phase_and_module_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkflowLog::new(dir.path());
        log.phase_transition("discovery").await.unwrap();
        log.module_transition("discovery", "completed", &[("hosts", "3")])
            .await
            .unwrap();
        log.message("short-circuiting to report: empty discovery")
            .await
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("workflow.log")).unwrap();
        assert!(content.contains("PHASE phase=discovery"));
        assert!(content.contains("MODULE module=discovery status=completed hosts=3"));
        assert!(content.contains("MSG short-circuiting"));
        assert_eq!(content.lines().count(), 3);
    }
}
