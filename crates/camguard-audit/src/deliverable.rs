//! Per-module deliverable JSON under `deliverables/`.
//!
//! Overwriting a deliverable file is an acceptable idempotent action — an
//! activity restarted after a missed heartbeat simply writes its result
//! again under the same fixed name.

use crate::error::AuditResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub fn deliverable_path(session_dir: &Path, name: &str) -> PathBuf {
    session_dir.join("deliverables").join(format!("{}.json", name))
}

pub async fn write_deliverable<T>(session_dir: &Path, name: &str, value: &T) -> AuditResult<()>
where
    T: Serialize,
{
    let path = deliverable_path(session_dir, name);
    let json = serde_json::to_string_pretty(value)?;
    tokio::task::spawn_blocking(move || {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &json)
    })
    .await
    .expect("blocking deliverable write panicked")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        value: u32,
    }

    #[tokio::test]
    async fn writes_and_overwrites_a_deliverable() {
        let dir = tempfile::tempdir().unwrap();
        write_deliverable(dir.path(), "discovery_results", &Sample { value: 1 })
            .await
            .unwrap();
        write_deliverable(dir.path(), "discovery_results", &Sample { value: 2 })
            .await
            .unwrap();

        let path = deliverable_path(dir.path(), "discovery_results");
        let content = std::fs::read_to_string(path).unwrap();
        let back: Sample = serde_json::from_str(&content).unwrap();
        assert_eq!(back, Sample { value: 2 });
    }
}
