// Artifact Domain Model
//
// An artifact is one captured screenshot in the watched directory. Records are
// derived from the filesystem on every query and never persisted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Extensions recognised as artifacts (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Placeholder label when a file name has no first token
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Placeholder kind when a file name has no second token
pub const UNKNOWN_KIND: &str = "unknown";

/// Media type tag attached to an artifact payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaType {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl MediaType {
    /// Infer from the file extension, falling back to PNG
    pub fn from_file_name(name: &str) -> Self {
        match extension_of(name).as_deref() {
            Some("jpg") | Some("jpeg") => MediaType::Jpeg,
            _ => MediaType::Png,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// True if the file name carries one of the image extensions
pub fn is_image_name(name: &str) -> bool {
    extension_of(name)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Split `<label>_<kind>_<anything>.ext` into (label, kind).
///
/// Best-effort convention: missing or empty tokens become placeholders.
pub fn parse_artifact_name(name: &str) -> (String, String) {
    let stem = match extension_of(name) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => &name[..name.len() - ext.len() - 1],
        _ => name,
    };

    let mut parts = stem.split('_');
    let label = parts
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_LABEL);
    let kind = parts
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_KIND);

    (label.to_string(), kind.to_string())
}

/// Human readable size, e.g. `12.00 KB`
pub fn format_size(size_bytes: u64) -> String {
    format!("{:.2} KB", size_bytes as f64 / 1024.0)
}

/// Artifact record (one image file in the watched directory)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub name: String,
    pub path: PathBuf,
    pub screen_label: String,
    pub kind: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

impl ArtifactRecord {
    pub fn new(
        name: impl Into<String>,
        path: PathBuf,
        size_bytes: u64,
        modified_at: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let (screen_label, kind) = parse_artifact_name(&name);
        Self {
            name,
            path,
            screen_label,
            kind,
            size_bytes,
            modified_at,
        }
    }

    pub fn media_type(&self) -> MediaType {
        MediaType::from_file_name(&self.name)
    }

    /// Listing view (includes size)
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            filename: self.name.clone(),
            screen_name: self.screen_label.clone(),
            kind: self.kind.clone(),
            size: Some(format_size(self.size_bytes)),
            modified: self.modified_iso(),
        }
    }

    /// Delta view (no size)
    pub fn delta_summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            size: None,
            ..self.summary()
        }
    }

    pub fn modified_iso(&self) -> String {
        self.modified_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Local-time rendering used in human readable headers
    pub fn modified_local(&self) -> String {
        self.modified_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// Wire view of an artifact record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub filename: String,
    pub screen_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub modified: String,
}

/// Binary payload of one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPayload {
    pub name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl ArtifactPayload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = MediaType::from_file_name(&name);
        Self {
            name,
            media_type,
            bytes,
        }
    }

    /// Standard base64 (padded) for inline transport
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}
