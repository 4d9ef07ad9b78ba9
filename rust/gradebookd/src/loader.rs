use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{GradebookError, Result};
use crate::model::StudentDocument;

pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LoadState {
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Loaded { student_count: usize, source: String },
    #[serde(rename_all = "camelCase")]
    Failed { source: String, message: String },
}

fn read_document(path: &Path) -> anyhow::Result<StudentDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    let doc: StudentDocument = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid student document", path.to_string_lossy()))?;
    Ok(doc)
}

/// Read and parse the document off the request loop, giving up after
/// `timeout`. Resolves exactly once.
pub fn load_document(path: &Path, timeout: Duration) -> Result<StudentDocument> {
    let (tx, rx) = mpsc::channel();
    let owned: PathBuf = path.to_path_buf();
    thread::spawn(move || {
        let _ = tx.send(read_document(&owned));
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(doc)) => Ok(doc),
        Ok(Err(e)) => Err(GradebookError::Load(format!("{e:#}"))),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(GradebookError::Load(format!(
            "timed out after {} ms",
            timeout.as_millis()
        ))),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(GradebookError::Load("loader thread exited".to_string()))
        }
    }
}
