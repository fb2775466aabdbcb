//! Both transports end to end: MCP over a byte stream, JSON-RPC over TCP via the SDK

mod common;

use common::harness;
use serde_json::{json, Value};
use snapbridge_api_rpc::{McpStdioServer, RpcServer, RpcServerConfig};
use snapbridge_sdk::{SdkError, SnapbridgeClient};

async fn run_stdio(server: &McpStdioServer, requests: &[Value]) -> Vec<Value> {
    let input: String = requests
        .iter()
        .map(|r| format!("{r}\n"))
        .collect();
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_stdio_session() {
    let h = harness();
    h.write_artifact("ShipScreen_auto_1.png", 2048, 1_737_383_400);
    let server = McpStdioServer::new(h.router.clone());

    let responses = run_stdio(
        &server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                   "params": {"protocolVersion": "2024-11-05"}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "list_screenshots", "arguments": {}}}),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "get_screenshot", "arguments": {"filename": "missing.png"}}}),
            json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"}),
        ],
    )
    .await;

    // The notification gets no response; the rest answer in order
    let ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "snapbridge");
    assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 12);

    let listed = &responses[2]["result"];
    assert_eq!(listed["isError"], false);
    let rows: Vec<Value> =
        serde_json::from_str(listed["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(rows[0]["size"], "2.00 KB");

    assert_eq!(
        responses[3]["result"]["content"][0]["text"],
        "Error: Screenshot \"missing.png\" not found"
    );
    assert_eq!(responses[4]["error"]["code"], -32601);
}

#[tokio::test]
async fn test_stdio_survives_garbage() {
    let h = harness();
    let server = McpStdioServer::new(h.router.clone());

    let input = "{not json\n\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n";
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["id"], 7);
    assert_eq!(responses[1]["result"], json!({}));
}

#[tokio::test]
async fn test_stdio_survives_undecodable_bytes() {
    let h = harness();
    let server = McpStdioServer::new(h.router.clone());

    let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
    input.extend_from_slice(b"\xff\xfe garbage\n");
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
    let mut output = Vec::new();
    server.serve(input.as_slice(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[1]["error"]["code"], -32700);
    assert_eq!(responses[2]["id"], 2);
}

#[tokio::test]
async fn test_tcp_round_trip_with_sdk() {
    let h = harness();
    h.write_artifact("ShipScreen_manual_1.png", 1024, 1_737_383_400);
    h.write_artifact("ShipScreen_auto_2.png", 1024, 1_737_383_460);
    h.write_artifact("CodexScreen_auto_1.png", 1024, 1_737_383_520);

    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let (addr, handle) = RpcServer::new(config, h.router.clone()).start().await.unwrap();
    let client = SnapbridgeClient::connect(format!("http://{addr}")).await.unwrap();

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 12);
    assert!(tools.iter().any(|t| t.name == "run_scenario"));

    let ship = client.list_screenshots(Some("ship"), Some(1)).await.unwrap();
    assert_eq!(ship.len(), 1);
    assert_eq!(ship[0].filename, "ShipScreen_auto_2.png");
    assert_eq!(ship[0].size.as_deref(), Some("1.00 KB"));

    let image = client
        .call_tool("get_screenshot", json!({ "filename": "CodexScreen_auto_1.png" }))
        .await
        .unwrap();
    let images = image.images().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].0, "image/png");
    assert_eq!(images[0].1.len(), 1024);

    let status = client.app_status().await.unwrap();
    assert_eq!(status["running"], false);

    let unknown = client.call_tool("fly_to_moon", json!({})).await.unwrap();
    assert!(unknown.is_error);
    assert!(unknown.text().unwrap().starts_with("Unknown tool: fly_to_moon"));

    match client.call_tool("", json!({})).await {
        Err(SdkError::Rpc { code, .. }) => assert_eq!(code, 4000),
        other => panic!("expected validation error, got {:?}", other.map(|r| r.is_error)),
    }

    handle.stop().unwrap();
}
