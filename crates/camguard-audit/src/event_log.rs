//! Per-module event log: `agents/<module>_attempt_<n>.jsonl`.
//!
//! Append-only. Every line is flushed and fsynced immediately so that a
//! crash mid-module leaves a consistent truncation boundary — the reader
//! never has to guess whether a trailing line is complete.

use crate::error::AuditResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub module: String,
    pub event: String,
    pub data: Value,
}

pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// `agents/<module>_attempt_<n>.jsonl` under the session directory.
    pub fn attempt_path(session_dir: &Path, module: &str, attempt: u32) -> PathBuf {
        session_dir
            .join("agents")
            .join(format!("{}_attempt_{}.jsonl", module, attempt))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        EventLog { path: path.into() }
    }

    /// Appends one record, flushing and fsyncing before returning — each
    /// attempt gets its own distinct file name, so an activity restart that
    /// re-runs this append is safe (idempotent at the file-identity level).
    pub async fn append(&self, module: &str, event: &str, data: Value) -> AuditResult<()> {
        let record = EventRecord {
            timestamp: Utc::now(),
            module: module.to_string(),
            event: event.to_string(),
            data,
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_sync(&path, &record))
            .await
            .expect("blocking event-log write panicked")
    }
}

fn append_sync(path: &Path, record: &EventRecord) -> AuditResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[tokio::test]
    async fn appends_flushed_jsonl_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = EventLog::attempt_path(dir.path(), "discovery", 1);
        let log = EventLog::new(&path);

        log.append("discovery", "started", serde_json::json!({"targets": 2}))
            .await
            .unwrap();
        log.append("discovery", "finished", serde_json::json!({"hosts": 5}))
            .await
            .unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let first: EventRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first.event, "started");
    }

    #[test]
    fn attempt_path_has_expected_shape() {
        let dir = Path::new("/tmp/session-1");
        let path = EventLog::attempt_path(dir, "cve-scanner", 3);
        assert_eq!(
            path,
            Path::new("/tmp/session-1/agents/cve-scanner_attempt_3.jsonl")
        );
    }
}
