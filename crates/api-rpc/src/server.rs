//! JSON-RPC Server
//!
//! Serves the tool router over TCP for the CLI and the SDK.

use crate::error::to_rpc_error;
use crate::handler::ToolRouter;
use crate::types::{CallToolRequest, ListToolsResponse, ToolResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use snapbridge_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

// Localhost only; the tools can start processes
pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9530;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    router: Arc<ToolRouter>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, router: Arc<ToolRouter>) -> Self {
        Self { config, router }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the server handle.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let mut module = RpcModule::new(());

        let router = self.router.clone();
        module
            .register_async_method("tools.list.v1", move |_params, _, _| {
                let router = router.clone();
                async move {
                    Ok::<_, ErrorObjectOwned>(ListToolsResponse {
                        tools: router.tools().to_vec(),
                    })
                }
            })
            .map_err(|e| e.to_string())?;

        let router = self.router.clone();
        module
            .register_async_method("tools.call.v1", move |params, _, _| {
                let router = router.clone();
                async move {
                    let req: CallToolRequest = params.parse()?;
                    if req.name.trim().is_empty() {
                        return Err(to_rpc_error(AppError::Validation(
                            "tool name must not be empty".to_string(),
                        )));
                    }
                    Ok::<ToolResult, ErrorObjectOwned>(router.call(&req.name, req.arguments).await)
                }
            })
            .map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}
