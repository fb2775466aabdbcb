// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// An external tool (build, kill) exited non-zero or timed out
    #[error("{tool} failed:\n{diagnostics}")]
    ExternalTool { tool: String, diagnostics: String },

    #[error("Unknown tool: {name}\nAvailable: {}", known.join(", "))]
    UnknownOperation { name: String, known: Vec<String> },

    #[error("Unknown scenario: {name}\nAvailable: {}", known.join(", "))]
    UnknownScenario { name: String, known: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
