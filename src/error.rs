//! Error types for wellflow
//!
//! Centralized error handling using thiserror. Only configuration and
//! plan-shape problems are represented here; per-step failures are data
//! (see [`crate::domain::StepFailure`]) and never surface as errors.

use thiserror::Error;

/// All error types that can leave a public wellflow entry point
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Dependency graph could not be layered (cycle or dangling reference)
    #[error("Cyclic dependencies between steps: {0:?}")]
    CyclicDependencies(Vec<u32>),

    /// A plan violated a structural invariant
    #[error("Plan invariant violated: {0}")]
    PlanInvariant(String),

    /// The worker pool was shut down before or during execution
    #[error("Worker pool has been shut down")]
    PoolShutdown,

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for wellflow operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;
