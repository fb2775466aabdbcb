//! Snapbridge CLI - Command-line client for a Snapbridge daemon running with
//! the TCP transport

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9530";

#[derive(Parser)]
#[command(name = "snapctl")]
#[command(about = "Snapbridge CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "SNAPBRIDGE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available tools
    Tools,

    /// List screenshots, newest first
    List {
        /// Only screenshots whose screen name contains this text
        #[arg(short, long)]
        screen: Option<String>,

        /// Maximum number of rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show the most recent screenshot
    Latest {
        #[arg(short, long)]
        screen: Option<String>,

        /// Save the image into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Fetch one screenshot by filename
    Get {
        filename: String,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Fetch two screenshots for comparison
    Compare {
        first: String,
        second: String,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Poll for new screenshots until Ctrl+C
    Watch {
        /// Seconds between polls
        #[arg(short, long, default_value = "2")]
        interval: u64,
    },

    /// Build the app
    Build {
        #[arg(long)]
        clean: bool,
    },

    /// Start the app
    Start {
        /// Screen to navigate to once started
        #[arg(short, long)]
        target_screen: Option<String>,

        /// Return without waiting for the app to settle
        #[arg(long)]
        no_wait: bool,
    },

    /// Stop the app
    Stop,

    /// Restart the app
    Restart {
        #[arg(long)]
        rebuild: bool,

        #[arg(short, long)]
        target_screen: Option<String>,
    },

    /// Send a command to the running app
    Send {
        /// navigate, click, press_key, wait, capture
        command: String,

        /// Parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,
    },

    /// Run a built-in scenario
    Scenario {
        name: String,

        /// Skip the capture steps
        #[arg(long)]
        no_capture: bool,
    },

    /// Show app status
    Status,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResult {
    content: Vec<ContentBlock>,
    #[serde(default)]
    is_error: bool,
}

#[derive(Deserialize)]
struct ToolInfo {
    name: String,
    description: String,
}

#[derive(Deserialize)]
struct ToolList {
    tools: Vec<ToolInfo>,
}

#[derive(Tabled)]
struct ToolRow {
    name: String,
    description: String,
}

#[derive(Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct ScreenshotRow {
    filename: String,
    #[serde(rename = "screenName")]
    screen: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: String,
    modified: String,
}

async fn call_rpc(url: &str, method: &str, params: Value) -> Result<Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn call_tool(url: &str, name: &str, arguments: Value) -> Result<ToolResult> {
    let result = call_rpc(
        url,
        "tools.call.v1",
        json!({ "name": name, "arguments": arguments }),
    )
    .await?;
    serde_json::from_value(result).context("Unexpected tool result shape")
}

/// Drop unset optional arguments so the daemon applies its defaults
fn arguments(pairs: Vec<(&str, Option<Value>)>) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();
    Value::Object(map)
}

fn parse_params(raw: Option<&str>) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw).context("Invalid JSON params")?;
    if !value.is_object() {
        anyhow::bail!("params must be a JSON object");
    }
    Ok(Some(value))
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        _ => "jpg",
    }
}

/// Keep the requested name when it already carries the right extension
fn output_file_name(stem: &str, mime_type: &str) -> String {
    let ext = extension_for(mime_type);
    let lower = stem.to_ascii_lowercase();
    if lower.ends_with(".png") || lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        stem.to_string()
    } else {
        format!("{}.{}", stem, ext)
    }
}

fn save_images(result: &ToolResult, out: &Path, stems: &[&str]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let mut saved = Vec::new();
    let images = result.content.iter().filter_map(|block| match block {
        ContentBlock::Image { data, mime_type } => Some((data, mime_type)),
        ContentBlock::Text { .. } => None,
    });

    for (index, (data, mime_type)) in images.enumerate() {
        let stem = stems
            .get(index)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("image-{}", index + 1));
        let path = out.join(output_file_name(&stem, mime_type));
        let bytes = STANDARD.decode(data).context("Invalid base64 image data")?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        saved.push(path);
    }

    Ok(saved)
}

fn print_result(result: &ToolResult) {
    for block in &result.content {
        match block {
            ContentBlock::Text { text } if result.is_error => println!("{}", text.red()),
            ContentBlock::Text { text } => println!("{}", text),
            ContentBlock::Image { data, mime_type } => println!(
                "{}",
                format!("[{} image, {} base64 chars]", mime_type, data.len()).dimmed()
            ),
        }
    }
}

fn finish(result: &ToolResult, out: Option<&Path>, stems: &[&str]) -> Result<()> {
    print_result(result);

    if let Some(out) = out {
        for path in save_images(result, out, stems)? {
            println!("{} {}", "✓ Saved".green().bold(), path.display());
        }
    }

    if result.is_error {
        anyhow::bail!("tool reported an error");
    }
    Ok(())
}

fn first_text(result: &ToolResult) -> Option<&str> {
    result.content.iter().find_map(|block| match block {
        ContentBlock::Text { text } => Some(text.as_str()),
        ContentBlock::Image { .. } => None,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.rpc_url.as_str();

    match cli.command {
        Commands::Tools => {
            let result = call_rpc(url, "tools.list.v1", json!({})).await?;
            let list: ToolList = serde_json::from_value(result)?;
            let rows: Vec<ToolRow> = list
                .tools
                .into_iter()
                .map(|t| ToolRow {
                    name: t.name,
                    description: t.description,
                })
                .collect();
            println!("{}", Table::new(rows));
        }

        Commands::List { screen, limit } => {
            let args = arguments(vec![
                ("screen_filter", screen.map(Value::from)),
                ("limit", limit.map(Value::from)),
            ]);
            let result = call_tool(url, "list_screenshots", args).await?;
            let rows: Option<Vec<ScreenshotRow>> =
                first_text(&result).and_then(|t| serde_json::from_str(t).ok());

            match rows {
                Some(rows) if rows.is_empty() => println!("{}", "No screenshots found".yellow()),
                Some(rows) => println!("{}", Table::new(rows)),
                None => finish(&result, None, &[])?,
            }
        }

        Commands::Latest { screen, out } => {
            let args = arguments(vec![("screen_name", screen.map(Value::from))]);
            let result = call_tool(url, "get_latest_screenshot", args).await?;
            finish(&result, out.as_deref(), &["latest"])?;
        }

        Commands::Get { filename, out } => {
            let result = call_tool(url, "get_screenshot", json!({ "filename": filename })).await?;
            finish(&result, out.as_deref(), &[filename.as_str()])?;
        }

        Commands::Compare { first, second, out } => {
            let args = json!({ "filename1": first, "filename2": second });
            let result = call_tool(url, "compare_screenshots", args).await?;
            finish(&result, out.as_deref(), &[first.as_str(), second.as_str()])?;
        }

        Commands::Watch { interval } => {
            println!(
                "{}",
                format!("Watching for screenshots every {}s (Ctrl+C to stop)", interval)
                    .cyan()
                    .bold()
            );
            let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = ticker.tick() => {
                        let result = call_tool(url, "watch_screenshots", json!({})).await?;
                        if let Some(text) = first_text(&result) {
                            if text.starts_with("Found") {
                                println!("{}", text.green());
                            }
                        }
                    }
                }
            }
        }

        Commands::Build { clean } => {
            println!("{}", "Building...".cyan().bold());
            let result = call_tool(url, "build_app", json!({ "clean": clean })).await?;
            finish(&result, None, &[])?;
        }

        Commands::Start {
            target_screen,
            no_wait,
        } => {
            let args = arguments(vec![
                ("target_screen", target_screen.map(Value::from)),
                ("wait_for_start", Some(Value::from(!no_wait))),
            ]);
            let result = call_tool(url, "start_app", args).await?;
            finish(&result, None, &[])?;
        }

        Commands::Stop => {
            let result = call_tool(url, "stop_app", json!({})).await?;
            finish(&result, None, &[])?;
        }

        Commands::Restart {
            rebuild,
            target_screen,
        } => {
            let args = arguments(vec![
                ("rebuild", Some(Value::from(rebuild))),
                ("target_screen", target_screen.map(Value::from)),
            ]);
            let result = call_tool(url, "restart_app", args).await?;
            finish(&result, None, &[])?;
        }

        Commands::Send { command, params } => {
            let args = arguments(vec![
                ("command", Some(Value::from(command))),
                ("params", parse_params(params.as_deref())?),
            ]);
            let result = call_tool(url, "send_command", args).await?;
            finish(&result, None, &[])?;
        }

        Commands::Scenario { name, no_capture } => {
            let args = json!({ "scenario": name, "capture_steps": !no_capture });
            let result = call_tool(url, "run_scenario", args).await?;
            finish(&result, None, &[])?;
        }

        Commands::Status => {
            println!("{}", "App Status".cyan().bold());
            println!();

            match call_tool(url, "get_app_status", json!({})).await {
                Ok(result) => {
                    let status: Value = first_text(&result)
                        .and_then(|t| serde_json::from_str(t).ok())
                        .unwrap_or(Value::Null);
                    println!("  {} {}", "RPC URL:".bold(), url);
                    let running = if status["running"].as_bool().unwrap_or(false) {
                        "RUNNING".green()
                    } else {
                        "STOPPED".yellow()
                    };
                    println!("  {} {}", "App:".bold(), running);
                    if let Some(map) = status.as_object() {
                        for (key, value) in map.iter().filter(|(k, _)| k.as_str() != "running") {
                            println!("  {} {}", format!("{}:", key).bold(), value);
                        }
                    }
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_drop_unset() {
        let args = arguments(vec![
            ("screen_filter", None),
            ("limit", Some(Value::from(3))),
        ]);
        assert_eq!(args, json!({"limit": 3}));
    }

    #[test]
    fn test_parse_params() {
        assert!(parse_params(None).unwrap().is_none());
        assert_eq!(
            parse_params(Some(r#"{"screen":"Ship"}"#)).unwrap(),
            Some(json!({"screen": "Ship"}))
        );
        assert!(parse_params(Some("[1]")).is_err());
        assert!(parse_params(Some("{oops")).is_err());
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("a.PNG", "image/png"), "a.PNG");
        assert_eq!(output_file_name("latest", "image/png"), "latest.png");
        assert_eq!(output_file_name("latest", "image/jpeg"), "latest.jpg");
    }

    #[test]
    fn test_save_images() {
        let dir = tempfile::tempdir().unwrap();
        let result: ToolResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Comparing"},
                {"type": "image", "data": "AQID", "mimeType": "image/png"},
                {"type": "image", "data": "BAU=", "mimeType": "image/jpeg"}
            ],
            "isError": false
        }))
        .unwrap();

        let saved = save_images(&result, dir.path(), &["one.png"]).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(std::fs::read(&saved[0]).unwrap(), vec![1, 2, 3]);
        assert!(saved[1].ends_with("image-2.jpg"));
        assert_eq!(std::fs::read(&saved[1]).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_screenshot_row_from_list_output() {
        let rows: Vec<ScreenshotRow> = serde_json::from_value(json!([{
            "filename": "Ship_auto_1.png",
            "screenName": "Ship",
            "type": "auto",
            "size": "12.00 KB",
            "modified": "2025-01-20T14:31:00.000Z"
        }]))
        .unwrap();
        assert_eq!(rows[0].screen, "Ship");
        assert_eq!(rows[0].kind, "auto");
    }
}
