//! Tool Argument and Result Types
//!
//! Arguments arrive as a JSON object and are parsed into one struct per tool.
//! Results use the MCP content-block shape on both transports.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snapbridge_core::domain::ArtifactPayload;

fn default_true() -> bool {
    true
}

/// list_screenshots
#[derive(Debug, Default, Deserialize)]
pub struct ListScreenshotsArgs {
    pub screen_filter: Option<String>,
    pub limit: Option<usize>,
}

/// get_latest_screenshot
#[derive(Debug, Default, Deserialize)]
pub struct GetLatestScreenshotArgs {
    pub screen_name: Option<String>,
}

/// get_screenshot
#[derive(Debug, Deserialize)]
pub struct GetScreenshotArgs {
    pub filename: String,
}

/// compare_screenshots
#[derive(Debug, Deserialize)]
pub struct CompareScreenshotsArgs {
    pub filename1: String,
    pub filename2: String,
}

/// build_app
#[derive(Debug, Default, Deserialize)]
pub struct BuildAppArgs {
    #[serde(default)]
    pub clean: bool,
}

/// start_app
#[derive(Debug, Deserialize)]
pub struct StartAppArgs {
    pub target_screen: Option<String>,
    #[serde(default = "default_true")]
    pub wait_for_start: bool,
}

/// restart_app
#[derive(Debug, Default, Deserialize)]
pub struct RestartAppArgs {
    #[serde(default)]
    pub rebuild: bool,
    pub target_screen: Option<String>,
}

/// send_command
#[derive(Debug, Deserialize)]
pub struct SendCommandArgs {
    pub command: String,
    pub params: Option<Value>,
}

/// run_scenario
#[derive(Debug, Deserialize)]
pub struct RunScenarioArgs {
    pub scenario: String,
    #[serde(default = "default_true")]
    pub capture_steps: bool,
}

/// One block of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        /// base64, standard alphabet
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

/// Outcome of one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: true,
        }
    }

    pub fn with_image(mut self, payload: &ArtifactPayload) -> Self {
        self.content.push(ContentBlock::Image {
            data: payload.to_base64(),
            mime_type: payload.media_type.as_str().to_string(),
        });
        self
    }

    /// First text block, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Image { .. } => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.content
            .iter()
            .filter(|block| matches!(block, ContentBlock::Image { .. }))
            .count()
    }
}

/// tools.call.v1 / tools/call parameters
#[derive(Debug, Deserialize)]
pub struct CallToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// tools.list.v1 result
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResponse {
    pub tools: Vec<crate::catalog::ToolDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_wire_shape() {
        let payload = ArtifactPayload::new("a.jpg", vec![1, 2, 3]);
        let result = ToolResult::text("Screenshot: a.jpg").with_image(&payload);

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "content": [
                    {"type": "text", "text": "Screenshot: a.jpg"},
                    {"type": "image", "data": "AQID", "mimeType": "image/jpeg"}
                ],
                "isError": false
            })
        );
    }

    #[test]
    fn test_start_args_defaults() {
        let args: StartAppArgs = serde_json::from_value(json!({})).unwrap();
        assert!(args.wait_for_start);
        assert!(args.target_screen.is_none());

        let args: RunScenarioArgs =
            serde_json::from_value(json!({"scenario": "x", "capture_steps": false})).unwrap();
        assert!(!args.capture_steps);
    }

    #[test]
    fn test_required_field_missing() {
        assert!(serde_json::from_value::<GetScreenshotArgs>(json!({})).is_err());
        assert!(serde_json::from_value::<ListScreenshotsArgs>(json!({"limit": "ten"})).is_err());
    }
}
