//! Shared wiring: real adapters over a temp project directory

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::Value;
use snapbridge_api_rpc::{ToolResult, ToolRouter};
use snapbridge_core::application::{
    ArtifactInventory, ProcessSupervisor, SupervisorConfig, SupervisorTimings,
};
use snapbridge_core::domain::LaunchSpec;
use snapbridge_core::port::id_provider::UuidProvider;
use snapbridge_core::port::time_provider::SystemTimeProvider;
use snapbridge_infra_fs::{FileCommandChannel, FsArtifactStore};
use snapbridge_infra_system::SubprocessLauncher;
use tempfile::TempDir;

pub struct Harness {
    pub root: TempDir,
    pub artifacts: PathBuf,
    pub supervisor: Arc<ProcessSupervisor>,
    pub router: Arc<ToolRouter>,
}

pub struct Commands {
    pub run: &'static str,
    pub build: &'static str,
    pub clean_build: &'static str,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            run: "sleep 30",
            build: "echo built",
            clean_build: "echo cleaning; echo built",
        }
    }
}

fn shell(script: &str, dir: &Path) -> LaunchSpec {
    LaunchSpec::new("sh", vec!["-c".to_string(), script.to_string()], dir.to_path_buf())
}

pub fn no_waits() -> SupervisorTimings {
    SupervisorTimings {
        startup_settle: Duration::ZERO,
        restart_settle: Duration::ZERO,
        build_timeout: Duration::from_secs(10),
        step_delay: Duration::ZERO,
    }
}

pub fn harness() -> Harness {
    harness_with(Commands::default())
}

pub fn harness_with(commands: Commands) -> Harness {
    let root = tempfile::tempdir().unwrap();
    let artifacts = root.path().join("debug_screenshots");

    let time_provider = Arc::new(SystemTimeProvider);
    let store = Arc::new(FsArtifactStore::new(artifacts.clone()));
    let channel = Arc::new(FileCommandChannel::new(artifacts.clone()));
    let launcher = Arc::new(SubprocessLauncher::new(time_provider.clone()));

    let config = SupervisorConfig {
        run: shell(commands.run, root.path()),
        build: shell(commands.build, root.path()),
        clean_build: shell(commands.clean_build, root.path()),
        timings: no_waits(),
    };

    let inventory = Arc::new(ArtifactInventory::new(store));
    let supervisor = Arc::new(ProcessSupervisor::new(
        launcher,
        channel,
        time_provider,
        Arc::new(UuidProvider),
        config,
    ));
    let router = Arc::new(ToolRouter::new(inventory, supervisor.clone()));

    Harness {
        root,
        artifacts,
        supervisor,
        router,
    }
}

impl Harness {
    /// Write `size` bytes and pin the mtime to `epoch_secs`
    pub fn write_artifact(&self, name: &str, size: usize, epoch_secs: u64) {
        std::fs::create_dir_all(&self.artifacts).unwrap();
        let path = self.artifacts.join(name);
        std::fs::write(&path, vec![0u8; size]).unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(epoch_secs))
            .unwrap();
    }

    pub fn queue_file(&self) -> PathBuf {
        self.artifacts.join(snapbridge_infra_fs::QUEUE_FILE_NAME)
    }

    pub fn status_file(&self) -> PathBuf {
        self.artifacts.join(snapbridge_infra_fs::STATUS_FILE_NAME)
    }

    pub async fn call(&self, name: &str, arguments: Value) -> ToolResult {
        self.router.call(name, Some(arguments)).await
    }
}

pub fn text(result: &ToolResult) -> &str {
    result.first_text().unwrap_or_default()
}
