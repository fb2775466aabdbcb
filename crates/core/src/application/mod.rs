// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod inventory;
pub mod supervisor;

// Re-exports
pub use inventory::{ArtifactInventory, LatestArtifact};
pub use supervisor::{
    BuildReport, ProcessSupervisor, StartOutcome, StopOutcome, SupervisorConfig,
    SupervisorTimings,
};
