// Artifact Store Port
// Read-only view over the watched screenshot directory

use crate::domain::ArtifactRecord;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Snapshot of every artifact currently present (no particular order)
    async fn scan(&self) -> Result<Vec<ArtifactRecord>>;

    /// Raw bytes of one artifact, `None` if no such file exists
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory artifact store
    #[derive(Default)]
    pub struct InMemoryArtifactStore {
        files: Mutex<Vec<(ArtifactRecord, Vec<u8>)>>,
    }

    impl InMemoryArtifactStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add(&self, name: &str, bytes: Vec<u8>, modified_at: DateTime<Utc>) {
            let record = ArtifactRecord::new(
                name,
                PathBuf::from("/mock").join(name),
                bytes.len() as u64,
                modified_at,
            );
            let mut files = self.files.lock().unwrap();
            files.retain(|(r, _)| r.name != name);
            files.push((record, bytes));
        }

        pub fn remove(&self, name: &str) {
            self.files.lock().unwrap().retain(|(r, _)| r.name != name);
        }
    }

    #[async_trait]
    impl ArtifactStore for InMemoryArtifactStore {
        async fn scan(&self) -> Result<Vec<ArtifactRecord>> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .map(|(r, _)| r.clone())
                .collect())
        }

        async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .find(|(r, _)| r.name == name)
                .map(|(_, b)| b.clone()))
        }
    }
}
