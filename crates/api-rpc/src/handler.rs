//! Tool Router
//!
//! Parses arguments, dispatches to the inventory or the supervisor and renders
//! every outcome as a `ToolResult`. Errors and panics never escape `call`.

use crate::catalog::{self, ToolDescriptor, TOOL_NAMES};
use crate::types::{
    BuildAppArgs, CompareScreenshotsArgs, GetLatestScreenshotArgs, GetScreenshotArgs,
    ListScreenshotsArgs, RestartAppArgs, RunScenarioArgs, SendCommandArgs, StartAppArgs,
    ToolResult,
};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use snapbridge_core::application::{ArtifactInventory, ProcessSupervisor};
use snapbridge_core::domain::ArtifactSummary;
use snapbridge_core::error::{AppError, Result};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Tool router with injected application services
pub struct ToolRouter {
    inventory: Arc<ArtifactInventory>,
    supervisor: Arc<ProcessSupervisor>,
    catalog: Vec<ToolDescriptor>,
}

impl ToolRouter {
    pub fn new(inventory: Arc<ArtifactInventory>, supervisor: Arc<ProcessSupervisor>) -> Self {
        Self {
            inventory,
            supervisor,
            catalog: catalog::tool_catalog(),
        }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    /// Run one tool. Always produces a result.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        info!(tool = %name, "Tool call");

        let outcome = AssertUnwindSafe(self.dispatch(name, arguments))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => render_error(name, err),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(tool = %name, panic = %message, "Tool handler panicked");
                ToolResult::failure(format!("Error: internal fault: {message}"))
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: Option<Value>) -> Result<ToolResult> {
        match name {
            catalog::LIST_SCREENSHOTS => {
                let args: ListScreenshotsArgs = parse_args(name, arguments)?;
                self.list_screenshots(args).await
            }
            catalog::GET_LATEST_SCREENSHOT => {
                let args: GetLatestScreenshotArgs = parse_args(name, arguments)?;
                self.get_latest_screenshot(args).await
            }
            catalog::GET_SCREENSHOT => {
                let args: GetScreenshotArgs = parse_args(name, arguments)?;
                let payload = self.inventory.get(&args.filename).await?;
                Ok(ToolResult::text(format!("Screenshot: {}", args.filename)).with_image(&payload))
            }
            catalog::WATCH_SCREENSHOTS => self.watch_screenshots().await,
            catalog::COMPARE_SCREENSHOTS => {
                let args: CompareScreenshotsArgs = parse_args(name, arguments)?;
                let (first, second) = self
                    .inventory
                    .compare(&args.filename1, &args.filename2)
                    .await?;
                Ok(ToolResult::text(format!(
                    "Comparing screenshots:\n1. {}\n2. {}",
                    args.filename1, args.filename2
                ))
                .with_image(&first)
                .with_image(&second))
            }
            catalog::BUILD_APP => {
                let args: BuildAppArgs = parse_args(name, arguments)?;
                let report = self.supervisor.build(args.clean).await?;
                Ok(ToolResult::text(report.message()))
            }
            catalog::START_APP => {
                let args: StartAppArgs = parse_args(name, arguments)?;
                let outcome = self
                    .supervisor
                    .start(args.target_screen.as_deref(), args.wait_for_start)
                    .await?;
                Ok(ToolResult::text(outcome.message()))
            }
            catalog::STOP_APP => {
                let outcome = self.supervisor.stop().await;
                if outcome.is_failure() {
                    Ok(ToolResult::failure(outcome.message()))
                } else {
                    Ok(ToolResult::text(outcome.message()))
                }
            }
            catalog::RESTART_APP => {
                let args: RestartAppArgs = parse_args(name, arguments)?;
                let trace = self
                    .supervisor
                    .restart(args.rebuild, args.target_screen.as_deref())
                    .await?;
                Ok(ToolResult::text(trace))
            }
            catalog::SEND_COMMAND => {
                let args: SendCommandArgs = parse_args(name, arguments)?;
                self.send_command(args).await
            }
            catalog::RUN_SCENARIO => {
                let args: RunScenarioArgs = parse_args(name, arguments)?;
                let trace = self
                    .supervisor
                    .run_scenario(&args.scenario, args.capture_steps)
                    .await?;
                Ok(ToolResult::text(trace.render()))
            }
            catalog::GET_APP_STATUS => {
                let status = self.supervisor.status().await?;
                Ok(ToolResult::text(serde_json::to_string_pretty(&status)?))
            }
            _ => Err(AppError::UnknownOperation {
                name: name.to_string(),
                known: TOOL_NAMES.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    async fn list_screenshots(&self, args: ListScreenshotsArgs) -> Result<ToolResult> {
        let summaries: Vec<ArtifactSummary> = self
            .inventory
            .list(args.screen_filter.as_deref(), args.limit)
            .await?
            .iter()
            .map(|r| r.summary())
            .collect();

        Ok(ToolResult::text(serde_json::to_string_pretty(&summaries)?))
    }

    async fn get_latest_screenshot(&self, args: GetLatestScreenshotArgs) -> Result<ToolResult> {
        let Some(latest) = self.inventory.latest(args.screen_name.as_deref()).await? else {
            return Ok(ToolResult::text("No screenshots found"));
        };

        let record = &latest.record;
        Ok(ToolResult::text(format!(
            "Latest screenshot: {} ({}, {}, {})",
            record.name,
            record.screen_label,
            record.kind,
            record.modified_local()
        ))
        .with_image(&latest.payload))
    }

    async fn watch_screenshots(&self) -> Result<ToolResult> {
        let fresh = self.inventory.delta().await?;
        if fresh.is_empty() {
            return Ok(ToolResult::text("No new screenshots since last check"));
        }

        let summaries: Vec<ArtifactSummary> = fresh.iter().map(|r| r.delta_summary()).collect();
        Ok(ToolResult::text(format!(
            "Found {} new screenshot(s):\n{}",
            fresh.len(),
            serde_json::to_string_pretty(&summaries)?
        )))
    }

    async fn send_command(&self, args: SendCommandArgs) -> Result<ToolResult> {
        let echo_params = args.params.is_some();
        let envelope = self
            .supervisor
            .send_command(&args.command, args.params)
            .await
            .map_err(|e| match e {
                AppError::Domain(d) => AppError::Validation(format!(
                    "Invalid arguments for {}: {}",
                    catalog::SEND_COMMAND,
                    d
                )),
                other => other,
            })?;

        let mut text = format!("Command sent: {}", envelope.command);
        if echo_params {
            text.push_str(&format!("\nParams: {}", envelope.params));
        }
        Ok(ToolResult::text(text))
    }
}

/// Missing or null arguments parse as an empty object
fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Option<Value>) -> Result<T> {
    let value = match arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };
    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Invalid arguments for {tool}: {e}")))
}

fn render_error(tool: &str, err: AppError) -> ToolResult {
    match err {
        AppError::NotFound(name) => {
            info!(tool = %tool, name = %name, "Requested artifact not found");
            ToolResult::text(format!("Error: Screenshot \"{name}\" not found"))
        }
        AppError::Validation(message) => {
            warn!(tool = %tool, error = %message, "Rejected tool arguments");
            ToolResult::failure(message)
        }
        err @ (AppError::ExternalTool { .. }
        | AppError::UnknownOperation { .. }
        | AppError::UnknownScenario { .. }) => {
            warn!(tool = %tool, error = %err, "Tool call failed");
            ToolResult::failure(err.to_string())
        }
        other => {
            error!(tool = %tool, error = %other, "Tool call failed");
            ToolResult::failure(format!("Error: {other}"))
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
