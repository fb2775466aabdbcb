// Port Layer - Interfaces for external dependencies

pub mod artifact_store;
pub mod command_channel;
pub mod id_provider; // For deterministic testing
pub mod process_launcher;
pub mod time_provider;

// Re-exports
pub use artifact_store::ArtifactStore;
pub use command_channel::CommandChannel;
pub use id_provider::IdProvider;
pub use process_launcher::{
    ExecutionError, ExecutionResult, ExecutionStatus, ManagedProcess, ProcessLauncher,
};
pub use time_provider::TimeProvider;
