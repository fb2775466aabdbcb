//! Snapbridge SDK - Rust Client Library
//!
//! Typed client for a Snapbridge daemon serving JSON-RPC over TCP.
//!
//! # Example
//!
//! ```no_run
//! use snapbridge_sdk::SnapbridgeClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SnapbridgeClient::connect("http://127.0.0.1:9530").await?;
//!
//!     for shot in client.list_screenshots(None, Some(5)).await? {
//!         println!("{} ({})", shot.filename, shot.screen_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::SnapbridgeClient;
pub use error::{Result, SdkError};
pub use types::{ContentBlock, ScreenshotSummary, ToolDescriptor, ToolResult};
