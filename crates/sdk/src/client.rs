//! Snapbridge Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{ListToolsResponse, ScreenshotSummary, ToolDescriptor, ToolResult};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde_json::{json, Value};
use std::time::Duration;

/// Build and restart can run for minutes
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Snapbridge Client
///
/// # Example
///
/// ```no_run
/// use snapbridge_sdk::SnapbridgeClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SnapbridgeClient::connect("http://127.0.0.1:9530").await?;
/// let shots = client.list_screenshots(Some("Ship"), Some(5)).await?;
/// # Ok(())
/// # }
/// ```
pub struct SnapbridgeClient {
    client: HttpClient,
}

impl SnapbridgeClient {
    /// Connect to a daemon started with `SNAPBRIDGE_TRANSPORT=tcp`
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let response: ListToolsResponse = self.client.request("tools.list.v1", rpc_params![]).await?;
        Ok(response.tools)
    }

    /// Invoke a tool by name
    ///
    /// A result with `is_error` set is returned as-is; only transport and
    /// protocol failures are errors here.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let mut params = ObjectParams::new();
        params.insert("name", name)?;
        params.insert("arguments", arguments)?;

        let response: ToolResult = self.client.request("tools.call.v1", params).await?;
        Ok(response)
    }

    /// Like `call_tool`, but an `is_error` result becomes `SdkError::Tool`
    async fn call_checked(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let result = self.call_tool(name, arguments).await?;
        if result.is_error {
            return Err(SdkError::Tool(result.text().unwrap_or_default().to_string()));
        }
        Ok(result)
    }

    pub async fn list_screenshots(
        &self,
        screen_filter: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ScreenshotSummary>> {
        let mut arguments = json!({});
        if let Some(filter) = screen_filter {
            arguments["screen_filter"] = json!(filter);
        }
        if let Some(limit) = limit {
            arguments["limit"] = json!(limit);
        }

        let result = self.call_checked("list_screenshots", arguments).await?;
        let text = result
            .text()
            .ok_or_else(|| SdkError::Other("list_screenshots returned no text".to_string()))?;
        Ok(serde_json::from_str(text)?)
    }

    /// `running`, `pid` and whatever the app last reported
    pub async fn app_status(&self) -> Result<Value> {
        let result = self.call_checked("get_app_status", json!({})).await?;
        let text = result
            .text()
            .ok_or_else(|| SdkError::Other("get_app_status returned no text".to_string()))?;
        Ok(serde_json::from_str(text)?)
    }

    pub async fn send_command(&self, command: &str, params: Option<Value>) -> Result<String> {
        let mut arguments = json!({ "command": command });
        if let Some(params) = params {
            arguments["params"] = params;
        }
        let result = self.call_checked("send_command", arguments).await?;
        Ok(result.text().unwrap_or_default().to_string())
    }
}
