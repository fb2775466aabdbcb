//! SDK Request/Response Types
//!
//! Mirrors the wire shapes served by the daemon.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::Value;

/// One entry of `tools.list.v1`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListToolsResponse {
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

/// Response from `tools.call.v1`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// First text block, if any
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Image { .. } => None,
        })
    }

    /// Decoded image blocks as `(mime_type, bytes)`
    pub fn images(&self) -> Result<Vec<(String, Vec<u8>)>, base64::DecodeError> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Image { data, mime_type } => Some((mime_type, data)),
                ContentBlock::Text { .. } => None,
            })
            .map(|(mime_type, data)| -> Result<_, base64::DecodeError> {
                Ok((mime_type.clone(), STANDARD.decode(data)?))
            })
            .collect()
    }
}

/// One row of `list_screenshots`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotSummary {
    pub filename: String,
    pub screen_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// `"12.00 KB"`, absent in watch results
    pub size: Option<String>,
    /// RFC 3339, UTC
    pub modified: String,
}
