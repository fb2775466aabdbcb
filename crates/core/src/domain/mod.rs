// Domain Layer - Pure business logic and entities

pub mod artifact;
pub mod command;
pub mod error;
pub mod launch;
pub mod scenario;

// Re-exports
pub use artifact::{
    format_size, is_image_name, parse_artifact_name, ArtifactPayload, ArtifactRecord,
    ArtifactSummary, MediaType,
};
pub use command::CommandEnvelope;
pub use error::DomainError;
pub use launch::LaunchSpec;
pub use scenario::{find_scenario, Scenario, ScenarioStep, ScenarioTrace, SCENARIO_NAMES};
