//! Tool API Layer
//!
//! Tool catalog and router, plus the two transports that expose it:
//! MCP over stdio and JSON-RPC 2.0 over TCP.

pub mod catalog;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod stdio;
pub mod types;

#[cfg(test)]
mod test_support;

pub use handler::ToolRouter;
pub use server::{RpcServer, RpcServerConfig};
pub use stdio::McpStdioServer;
pub use types::{ContentBlock, ToolResult};
