//! Artifact Inventory - query facade over the screenshot directory
//!
//! Owns the observed-set used by `delta`. Everything else is recomputed from
//! the store on every call.

use crate::application::constants::DEFAULT_LIST_LIMIT;
use crate::domain::{ArtifactPayload, ArtifactRecord};
use crate::error::{AppError, Result};
use crate::port::ArtifactStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Latest artifact together with its bytes
#[derive(Debug, Clone)]
pub struct LatestArtifact {
    pub record: ArtifactRecord,
    pub payload: ArtifactPayload,
}

pub struct ArtifactInventory {
    store: Arc<dyn ArtifactStore>,
    observed: Mutex<HashSet<String>>,
}

impl ArtifactInventory {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            observed: Mutex::new(HashSet::new()),
        }
    }

    /// All artifacts, newest first (ties broken by name)
    async fn snapshot(&self) -> Result<Vec<ArtifactRecord>> {
        let mut records = self.store.scan().await?;
        records.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(records)
    }

    /// List artifacts, optionally filtered by a case-insensitive label substring.
    ///
    /// A limit of `None` or `0` falls back to the default of 10.
    pub async fn list(
        &self,
        screen_filter: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ArtifactRecord>> {
        let limit = match limit {
            Some(n) if n > 0 => n,
            _ => DEFAULT_LIST_LIMIT,
        };
        let needle = screen_filter
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);

        let records: Vec<ArtifactRecord> = self
            .snapshot()
            .await?
            .into_iter()
            .filter(|r| match &needle {
                Some(n) => r.screen_label.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .take(limit)
            .collect();

        debug!(count = records.len(), filter = ?screen_filter, "Listed artifacts");
        Ok(records)
    }

    /// Newest artifact, optionally restricted to one screen label (case-insensitive equality)
    pub async fn latest(&self, screen_name: Option<&str>) -> Result<Option<LatestArtifact>> {
        let wanted = screen_name
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let record = self
            .snapshot()
            .await?
            .into_iter()
            .find(|r| match &wanted {
                Some(label) => r.screen_label.to_lowercase() == *label,
                None => true,
            });

        let Some(record) = record else {
            return Ok(None);
        };

        let payload = self.get(&record.name).await?;
        Ok(Some(LatestArtifact { record, payload }))
    }

    /// Fetch one artifact by file name
    ///
    /// # Errors
    /// - AppError::NotFound if no such artifact exists
    pub async fn get(&self, name: &str) -> Result<ArtifactPayload> {
        if !is_plain_file_name(name) {
            return Err(AppError::NotFound(name.to_string()));
        }

        match self.store.read(name).await? {
            Some(bytes) => Ok(ArtifactPayload::new(name, bytes)),
            None => Err(AppError::NotFound(name.to_string())),
        }
    }

    /// Fetch two artifacts for side-by-side comparison
    pub async fn compare(
        &self,
        first: &str,
        second: &str,
    ) -> Result<(ArtifactPayload, ArtifactPayload)> {
        let a = self.get(first).await?;
        let b = self.get(second).await?;
        Ok((a, b))
    }

    /// Artifacts not seen by the previous call, then advance the observed-set
    pub async fn delta(&self) -> Result<Vec<ArtifactRecord>> {
        let current = self.snapshot().await?;

        let mut observed = self
            .observed
            .lock()
            .map_err(|_| AppError::Internal("observed-set lock poisoned".to_string()))?;

        let fresh: Vec<ArtifactRecord> = current
            .iter()
            .filter(|r| !observed.contains(&r.name))
            .cloned()
            .collect();

        *observed = current.into_iter().map(|r| r.name).collect();

        info!(new = fresh.len(), observed = observed.len(), "Checked for new artifacts");
        Ok(fresh)
    }
}

/// A bare file name: no separators, no parent references
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
