//! Tool Catalog
//!
//! Static descriptors advertised by `tools/list`. The router dispatches on the
//! same names.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const LIST_SCREENSHOTS: &str = "list_screenshots";
pub const GET_LATEST_SCREENSHOT: &str = "get_latest_screenshot";
pub const GET_SCREENSHOT: &str = "get_screenshot";
pub const WATCH_SCREENSHOTS: &str = "watch_screenshots";
pub const COMPARE_SCREENSHOTS: &str = "compare_screenshots";
pub const BUILD_APP: &str = "build_app";
pub const START_APP: &str = "start_app";
pub const STOP_APP: &str = "stop_app";
pub const RESTART_APP: &str = "restart_app";
pub const SEND_COMMAND: &str = "send_command";
pub const RUN_SCENARIO: &str = "run_scenario";
pub const GET_APP_STATUS: &str = "get_app_status";

/// Every tool name, in catalog order
pub const TOOL_NAMES: [&str; 12] = [
    LIST_SCREENSHOTS,
    GET_LATEST_SCREENSHOT,
    GET_SCREENSHOT,
    WATCH_SCREENSHOTS,
    COMPARE_SCREENSHOTS,
    BUILD_APP,
    START_APP,
    STOP_APP,
    RESTART_APP,
    SEND_COMMAND,
    RUN_SCENARIO,
    GET_APP_STATUS,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

fn descriptor(name: &str, description: &str, properties: Value, required: &[&str]) -> ToolDescriptor {
    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    ToolDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: schema,
    }
}

pub fn tool_catalog() -> Vec<ToolDescriptor> {
    vec![
        descriptor(
            LIST_SCREENSHOTS,
            "List available debug screenshots, newest first. Returns metadata including screen name, type (auto/manual), size and timestamp.",
            json!({
                "screen_filter": {
                    "type": "string",
                    "description": "Optional: filter by screen name (e.g., \"ShipScreen\")"
                },
                "limit": {
                    "type": "integer",
                    "description": "Optional: limit number of results (default: 10)"
                }
            }),
            &[],
        ),
        descriptor(
            GET_LATEST_SCREENSHOT,
            "Get the most recent screenshot as image data.",
            json!({
                "screen_name": {
                    "type": "string",
                    "description": "Optional: latest from a specific screen (e.g., \"ShipScreenNew\")"
                }
            }),
            &[],
        ),
        descriptor(
            GET_SCREENSHOT,
            "Get a specific screenshot by filename as image data.",
            json!({
                "filename": {
                    "type": "string",
                    "description": "The screenshot filename (e.g., \"ShipScreenNew_manual_2025-01-20_14-30-00.png\")"
                }
            }),
            &["filename"],
        ),
        descriptor(
            WATCH_SCREENSHOTS,
            "Check for screenshots that appeared since the last check.",
            json!({}),
            &[],
        ),
        descriptor(
            COMPARE_SCREENSHOTS,
            "Return two screenshots side by side for comparison.",
            json!({
                "filename1": { "type": "string", "description": "First screenshot filename" },
                "filename2": { "type": "string", "description": "Second screenshot filename" }
            }),
            &["filename1", "filename2"],
        ),
        descriptor(
            BUILD_APP,
            "Build the app with the configured build command. Returns build output.",
            json!({
                "clean": {
                    "type": "boolean",
                    "description": "Whether to run clean before build (default: false)"
                }
            }),
            &[],
        ),
        descriptor(
            START_APP,
            "Start the app. Can specify which screen to navigate to after launch.",
            json!({
                "target_screen": {
                    "type": "string",
                    "description": "Optional: screen to navigate to (e.g., \"ShipScreen\", \"CodexScreen\")"
                },
                "wait_for_start": {
                    "type": "boolean",
                    "description": "Wait for the app to settle before returning (default: true)"
                }
            }),
            &[],
        ),
        descriptor(
            STOP_APP,
            "Stop the running app and every process it started.",
            json!({}),
            &[],
        ),
        descriptor(
            RESTART_APP,
            "Restart the app. Optionally rebuild before restarting.",
            json!({
                "rebuild": {
                    "type": "boolean",
                    "description": "Whether to rebuild before restarting (default: false)"
                },
                "target_screen": {
                    "type": "string",
                    "description": "Optional: screen to navigate to after restart"
                }
            }),
            &[],
        ),
        descriptor(
            SEND_COMMAND,
            "Send a command to the running app (navigate, click, press_key, wait, capture).",
            json!({
                "command": {
                    "type": "string",
                    "description": "Command type: \"navigate\", \"click\", \"press_key\", \"wait\", \"capture\""
                },
                "params": {
                    "type": "object",
                    "description": "Command parameters (varies by command type)"
                }
            }),
            &["command"],
        ),
        descriptor(
            RUN_SCENARIO,
            "Run a built-in scenario (sequence of commands) to reach and capture a specific app state.",
            json!({
                "scenario": {
                    "type": "string",
                    "description": "Scenario name: \"test_energy_blocks\", \"navigate_all_screens\", \"test_crew_movement\""
                },
                "capture_steps": {
                    "type": "boolean",
                    "description": "Send the capture steps of the scenario (default: true)"
                }
            }),
            &["scenario"],
        ),
        descriptor(
            GET_APP_STATUS,
            "Get current status of the app (running, pid, and whatever the app reports).",
            json!({}),
            &[],
        ),
    ]
}
