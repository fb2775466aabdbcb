//! Snapbridge - Main Entry Point
//!
//! Composition root: reads config, wires adapters into the core services and
//! serves the tool catalog over the selected transport.

mod config;
mod logging;

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use snapbridge_api_rpc::{McpStdioServer, RpcServer, ToolRouter};
use snapbridge_core::application::{ArtifactInventory, ProcessSupervisor};
use snapbridge_core::port::id_provider::UuidProvider;
use snapbridge_core::port::time_provider::SystemTimeProvider;
use snapbridge_core::VERSION;
use snapbridge_infra_fs::{FileCommandChannel, FsArtifactStore};
use snapbridge_infra_system::SubprocessLauncher;

use config::{DaemonConfig, Transport};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging
    let _log_guard = logging::init(config.log_format, config.log_dir.as_deref())?;

    info!("Snapbridge v{} starting...", VERSION);

    if let Err(e) = run(config).await {
        error!(error = %format!("{:#}", e), "Fatal error");
        return Err(e);
    }

    info!("Shutdown complete.");
    Ok(())
}

async fn run(config: DaemonConfig) -> Result<()> {
    info!(
        project_root = %config.project_root.display(),
        artifact_dir = %config.artifact_dir.display(),
        run_command = %config.run_command,
        transport = ?config.transport,
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let store = Arc::new(FsArtifactStore::new(config.artifact_dir.clone()));
    let channel = Arc::new(FileCommandChannel::new(config.artifact_dir.clone()));
    let launcher = Arc::new(SubprocessLauncher::new(time_provider.clone()));

    let inventory = Arc::new(ArtifactInventory::new(store));
    let supervisor = Arc::new(ProcessSupervisor::new(
        launcher,
        channel,
        time_provider,
        id_provider,
        config.supervisor_config()?,
    ));
    let router = Arc::new(ToolRouter::new(inventory, supervisor.clone()));

    // 4. Serve
    let served = serve(&config, router).await;

    // 5. Do not leave the supervised app orphaned, even when serving failed
    let outcome = supervisor.stop().await;
    info!(outcome = %outcome.message(), "Supervised app released");

    served
}

async fn serve(config: &DaemonConfig, router: Arc<ToolRouter>) -> Result<()> {
    match config.transport {
        Transport::Stdio => {
            info!("Serving MCP over stdio");
            McpStdioServer::new(router)
                .run()
                .await
                .context("stdio transport failed")?;
            info!("stdin closed. Exiting...");
        }
        Transport::Tcp => {
            let (addr, handle) = RpcServer::new(config.rpc_config(), router)
                .start()
                .await
                .map_err(|e| anyhow!("RPC server start failed: {}", e))?;

            info!(addr = %addr, "System ready. Press Ctrl+C to shutdown");
            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received. Exiting gracefully...");

            handle
                .stop()
                .map_err(|e| anyhow!("RPC server stop failed: {}", e))?;
        }
    }

    Ok(())
}
