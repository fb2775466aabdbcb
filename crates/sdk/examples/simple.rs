//! Simple SDK Example
//!
//! # Usage
//!
//! 1. Start the daemon with the TCP transport:
//!    ```bash
//!    SNAPBRIDGE_TRANSPORT=tcp cargo run --package snapbridge-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package snapbridge-sdk --example simple
//!    ```

use serde_json::json;
use snapbridge_sdk::SnapbridgeClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Snapbridge SDK - Simple Example");
    println!("================================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = SnapbridgeClient::connect("http://127.0.0.1:9530").await?;
    println!("   ✓ Connected\n");

    // 2. Tools
    println!("2. Listing tools...");
    for tool in client.list_tools().await? {
        println!("     - {}", tool.name);
    }
    println!();

    // 3. Screenshots
    println!("3. Recent screenshots...");
    let shots = client.list_screenshots(None, Some(5)).await?;
    if shots.is_empty() {
        println!("   (none)");
    }
    for shot in &shots {
        println!(
            "     - {} [{} / {}] {}",
            shot.filename,
            shot.screen_name,
            shot.kind,
            shot.size.as_deref().unwrap_or("")
        );
    }
    println!();

    // 4. Latest image
    println!("4. Fetching latest screenshot...");
    let latest = client.call_tool("get_latest_screenshot", json!({})).await?;
    println!("   {}", latest.text().unwrap_or_default());
    for (mime_type, bytes) in latest.images()? {
        println!("   ✓ {} bytes of {}", bytes.len(), mime_type);
    }
    println!();

    // 5. Status
    println!("5. App status...");
    let status = client.app_status().await?;
    println!("   {}", serde_json::to_string_pretty(&status)?);

    println!("\n✓ Example completed successfully!");

    Ok(())
}
