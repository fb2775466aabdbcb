//! Router fixtures shared by the unit tests of this crate

use crate::handler::ToolRouter;
use snapbridge_core::application::{
    ArtifactInventory, ProcessSupervisor, SupervisorConfig, SupervisorTimings,
};
use snapbridge_core::domain::LaunchSpec;
use snapbridge_core::port::artifact_store::mocks::InMemoryArtifactStore;
use snapbridge_core::port::command_channel::mocks::RecordingCommandChannel;
use snapbridge_core::port::id_provider::mocks::SequentialIdProvider;
use snapbridge_core::port::process_launcher::mocks::MockProcessLauncher;
use snapbridge_core::port::time_provider::mocks::ManualTimeProvider;
use snapbridge_core::port::ArtifactStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct Fixture {
    pub store: Arc<InMemoryArtifactStore>,
    pub launcher: Arc<MockProcessLauncher>,
    pub channel: Arc<RecordingCommandChannel>,
    pub router: Arc<ToolRouter>,
}

pub fn zero_timings() -> SupervisorTimings {
    SupervisorTimings {
        startup_settle: Duration::ZERO,
        restart_settle: Duration::ZERO,
        build_timeout: Duration::from_secs(1),
        step_delay: Duration::ZERO,
    }
}

pub fn router_with_store(
    store: Arc<dyn ArtifactStore>,
) -> (Arc<ToolRouter>, Arc<MockProcessLauncher>, Arc<RecordingCommandChannel>) {
    let launcher = Arc::new(MockProcessLauncher::new_success());
    let channel = Arc::new(RecordingCommandChannel::new());
    let root = PathBuf::from("/project");
    let supervisor = ProcessSupervisor::new(
        launcher.clone(),
        channel.clone(),
        Arc::new(ManualTimeProvider::new(1_000)),
        Arc::new(SequentialIdProvider::default()),
        SupervisorConfig {
            run: LaunchSpec::parse("./gradlew desktop:run", root.clone()).unwrap(),
            build: LaunchSpec::parse("./gradlew desktop:build", root.clone()).unwrap(),
            clean_build: LaunchSpec::parse("./gradlew clean desktop:build", root).unwrap(),
            timings: zero_timings(),
        },
    );
    let router = ToolRouter::new(
        Arc::new(ArtifactInventory::new(store)),
        Arc::new(supervisor),
    );
    (Arc::new(router), launcher, channel)
}

pub fn setup() -> Fixture {
    let store = Arc::new(InMemoryArtifactStore::new());
    let (router, launcher, channel) = router_with_store(store.clone());
    Fixture {
        store,
        launcher,
        channel,
        router,
    }
}
