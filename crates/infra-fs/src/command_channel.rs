// File-based CommandChannel Implementation
//
// The supervised app polls the queue file and writes the status file; both live
// in the artifact directory.

use async_trait::async_trait;
use serde_json::{Map, Value};
use snapbridge_core::domain::CommandEnvelope;
use snapbridge_core::error::Result;
use snapbridge_core::port::CommandChannel;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Pending command, overwritten on every dispatch
pub const QUEUE_FILE_NAME: &str = "command_queue.json";

/// Status document written by the app
pub const STATUS_FILE_NAME: &str = "game_status.json";

pub struct FileCommandChannel {
    dir: PathBuf,
}

impl FileCommandChannel {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn queue_path(&self) -> PathBuf {
        self.dir.join(QUEUE_FILE_NAME)
    }

    pub fn status_path(&self) -> PathBuf {
        self.dir.join(STATUS_FILE_NAME)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl CommandChannel for FileCommandChannel {
    async fn dispatch(&self, envelope: &CommandEnvelope) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_vec_pretty(envelope)?;

        // Whole-file replace; the reader never sees a partial document.
        // Timestamps are unique per process, so concurrent writers never share a temp file.
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", QUEUE_FILE_NAME, envelope.timestamp));
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, self.queue_path()).await?;

        debug!(
            command = %envelope.command,
            timestamp = envelope.timestamp,
            path = %self.queue_path().display(),
            "Wrote command queue"
        );
        Ok(())
    }

    async fn read_status(&self) -> Result<Option<Map<String, Value>>> {
        let bytes = match tokio::fs::read(self.status_path()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(document)) => Ok(Some(document)),
            Ok(other) => {
                warn!(kind = ?other, "Ignoring status document that is not a JSON object");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unparsable status document");
                Ok(None)
            }
        }
    }
}
