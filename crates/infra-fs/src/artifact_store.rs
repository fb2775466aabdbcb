// Filesystem ArtifactStore Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snapbridge_core::domain::{is_image_name, ArtifactRecord};
use snapbridge_core::error::Result;
use snapbridge_core::port::ArtifactStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Image files directly inside one directory (no recursion)
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn scan(&self) -> Result<Vec<ArtifactRecord>> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut records = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                debug!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            if !is_image_name(&name) {
                continue;
            }

            // Files may vanish between listing and stat
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(file = %name, error = %e, "Skipping unreadable artifact");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let modified_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

            records.push(ArtifactRecord::new(
                name,
                entry.path(),
                metadata.len(),
                modified_at,
            ));
        }

        debug!(count = records.len(), dir = %self.dir.display(), "Scanned artifact directory");
        Ok(records)
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsArtifactStore) {
        let temp = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(temp.path().join("debug_screenshots"));
        (temp, store)
    }

    #[tokio::test]
    async fn test_scan_creates_missing_directory() {
        let (_temp, store) = setup();
        assert!(!store.dir().exists());

        let records = store.scan().await.unwrap();
        assert!(records.is_empty());
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_scan_filters_images() {
        let (_temp, store) = setup();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("ShipScreen_auto.png"), vec![0u8; 2048]).unwrap();
        std::fs::write(store.dir().join("Codex_manual.JPG"), b"jpg").unwrap();
        std::fs::write(store.dir().join("notes.txt"), b"ignored").unwrap();
        std::fs::write(store.dir().join("command_queue.json"), b"{}").unwrap();
        std::fs::create_dir_all(store.dir().join("nested.png")).unwrap();

        let mut records = store.scan().await.unwrap();
        records.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Codex_manual.JPG");
        assert_eq!(records[1].screen_label, "ShipScreen");
        assert_eq!(records[1].kind, "auto");
        assert_eq!(records[1].size_bytes, 2048);
    }

    #[tokio::test]
    async fn test_read_existing_and_missing() {
        let (_temp, store) = setup();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("a.png"), [1u8, 2, 3]).unwrap();

        assert_eq!(store.read("a.png").await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.read("b.png").await.unwrap(), None);
    }
}
