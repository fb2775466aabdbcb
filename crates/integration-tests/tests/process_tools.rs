//! Lifecycle, build and command tools with real child processes

#![cfg(unix)]

mod common;

use std::time::Duration;

use common::{harness, harness_with, text, Commands};
use serde_json::{json, Value};

fn pid_of(message: &str) -> u32 {
    let start = message.find("PID: ").unwrap() + 5;
    message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap()
}

fn read_queue(path: &std::path::Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_start_stop_lifecycle() {
    let h = harness();

    let started = h.call("start_app", json!({})).await;
    assert!(!started.is_error);
    let pid = pid_of(text(&started));
    assert!(text(&started).starts_with("App started (PID: "));

    let status: Value = serde_json::from_str(text(&h.call("get_app_status", json!({})).await)).unwrap();
    assert_eq!(status["running"], true);
    assert_eq!(status["pid"], pid);

    // No second spawn while the first is alive
    let again = h.call("start_app", json!({})).await;
    assert_eq!(
        text(&again),
        format!("App is already running (PID: {pid}). Use stop_app first or use restart_app.")
    );

    let stopped = h.call("stop_app", json!({})).await;
    assert!(!stopped.is_error);
    assert_eq!(text(&stopped), format!("App stopped successfully (PID: {pid})."));

    let idle = h.call("stop_app", json!({})).await;
    assert_eq!(text(&idle), "No app process running.");
    let idle_again = h.call("stop_app", json!({})).await;
    assert_eq!(text(&idle_again), "No app process running.");

    let status: Value = serde_json::from_str(text(&h.call("get_app_status", json!({})).await)).unwrap();
    assert_eq!(status["running"], false);
    assert_eq!(status["pid"], Value::Null);
}

#[tokio::test]
async fn test_start_with_target_screen_queues_navigation() {
    let h = harness();

    let started = h
        .call("start_app", json!({ "target_screen": "CodexScreen" }))
        .await;
    assert!(text(&started).ends_with("\nNavigating to: CodexScreen"));

    let queued = read_queue(&h.queue_file());
    assert_eq!(queued["command"], "navigate");
    assert_eq!(queued["params"], json!({ "screen": "CodexScreen" }));
    assert!(queued["timestamp"].as_i64().unwrap() > 0);

    h.supervisor.stop().await;
}

#[tokio::test]
async fn test_exited_app_reported_not_running() {
    let h = harness_with(Commands {
        run: "exit 0",
        ..Commands::default()
    });

    h.call("start_app", json!({ "wait_for_start": false })).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let status: Value = serde_json::from_str(text(&h.call("get_app_status", json!({})).await)).unwrap();
    assert_eq!(status["running"], false);

    // A dead handle does not block a fresh start
    let restarted = h.call("start_app", json!({})).await;
    assert!(text(&restarted).starts_with("App started"));
}

#[tokio::test]
async fn test_status_merges_app_document() {
    let h = harness();
    std::fs::create_dir_all(&h.artifacts).unwrap();
    std::fs::write(
        h.status_file(),
        r#"{"currentScreen": "ShipScreen", "running": "reported by app"}"#,
    )
    .unwrap();

    let status: Value = serde_json::from_str(text(&h.call("get_app_status", json!({})).await)).unwrap();
    assert_eq!(status["currentScreen"], "ShipScreen");
    assert_eq!(status["running"], "reported by app");
    assert_eq!(status["pid"], Value::Null);

    std::fs::write(h.status_file(), "not json").unwrap();
    let status: Value = serde_json::from_str(text(&h.call("get_app_status", json!({})).await)).unwrap();
    assert_eq!(status, json!({ "running": false, "pid": null }));
}

#[tokio::test]
async fn test_build_success_and_clean() {
    let h = harness();

    let built = h.call("build_app", json!({})).await;
    assert!(!built.is_error);
    assert_eq!(text(&built), "Build completed successfully.\n\nOutput:\nbuilt\n");

    let clean = h.call("build_app", json!({ "clean": true })).await;
    assert!(text(&clean).starts_with("Build (clean) completed successfully."));
    assert!(text(&clean).contains("cleaning"));
}

#[tokio::test]
async fn test_build_failure_is_error() {
    let h = harness_with(Commands {
        build: "echo 'compile error in Main.kt' >&2; exit 2",
        ..Commands::default()
    });

    let result = h.call("build_app", json!({})).await;
    assert!(result.is_error);
    assert!(text(&result).starts_with("Build failed:\n"));
    assert!(text(&result).contains("compile error in Main.kt"));
}

#[tokio::test]
async fn test_restart_replaces_running_app() {
    let h = harness();

    let first = pid_of(text(&h.call("start_app", json!({})).await));

    let restarted = h
        .call("restart_app", json!({ "rebuild": true, "target_screen": "ShipScreen" }))
        .await;
    assert!(!restarted.is_error);
    let body = text(&restarted);
    assert!(body.starts_with("Restarting app...\nStopped existing app.\nBuilding app...\nBuild completed.\n"));
    assert!(body.ends_with("\nNavigating to: ShipScreen"));

    let second = pid_of(body);
    assert_ne!(first, second);

    h.supervisor.stop().await;
}

#[tokio::test]
async fn test_restart_rebuild_failure_starts_nothing() {
    let h = harness_with(Commands {
        build: "echo broken >&2; exit 1",
        ..Commands::default()
    });

    let result = h.call("restart_app", json!({ "rebuild": true })).await;
    assert!(result.is_error);
    assert!(text(&result).starts_with("Rebuild failed:\n"));

    let status: Value = serde_json::from_str(text(&h.call("get_app_status", json!({})).await)).unwrap();
    assert_eq!(status["running"], false);
}

#[tokio::test]
async fn test_send_command_overwrites_queue() {
    let h = harness();

    let sent = h
        .call("send_command", json!({ "command": "click", "params": { "x": 10, "y": 20 } }))
        .await;
    assert_eq!(
        text(&sent),
        "Command sent: click\nParams: {\"x\":10,\"y\":20}"
    );
    let first = read_queue(&h.queue_file());

    let sent = h.call("send_command", json!({ "command": "capture" })).await;
    assert_eq!(text(&sent), "Command sent: capture");
    let second = read_queue(&h.queue_file());

    assert_eq!(second["command"], "capture");
    assert_eq!(second["params"], json!({}));
    assert!(second["timestamp"].as_i64() > first["timestamp"].as_i64());
}

#[tokio::test]
async fn test_unknown_scenario_leaves_queue_untouched() {
    let h = harness();

    let result = h.call("run_scenario", json!({ "scenario": "unknown_name" })).await;
    assert!(result.is_error);
    assert_eq!(
        text(&result),
        "Unknown scenario: unknown_name\nAvailable: test_energy_blocks, navigate_all_screens, test_crew_movement"
    );
    assert!(!h.queue_file().exists());
}
