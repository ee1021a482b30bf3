//! Tool invocation seam
//!
//! The runner calls a [`ToolInvoker`] once per step. Concrete well-data tools
//! live outside this crate; they plug in as [`ToolHandler`]s registered on a
//! [`ToolRegistry`].

mod dry_run;
mod registry;
mod upstream;

pub use dry_run::DryRunTool;
pub use registry::ToolRegistry;
pub use upstream::upstream_payloads;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ExecutionStep, RunContext, StepResults};

/// Errors a tool invocation can return
#[derive(Debug, Error)]
pub enum ToolError {
    /// No handler registered for the tool
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Step parameters were missing or malformed
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A dependency has no entry in the prior results
    #[error("Missing result for upstream step {0}")]
    MissingUpstream(u32),

    /// A dependency finished with a failure
    #[error("Upstream step {step_id} failed: {message}")]
    UpstreamFailed { step_id: u32, message: String },

    /// The tool ran and failed
    #[error("{0}")]
    Failed(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other error raised by a handler
    #[error(transparent)]
    Other(#[from] eyre::Report),
}

impl ToolError {
    /// Variant name, recorded alongside the message in step failures
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "UnknownTool",
            Self::InvalidParameters(_) => "InvalidParameters",
            Self::MissingUpstream(_) => "MissingUpstream",
            Self::UpstreamFailed { .. } => "UpstreamFailed",
            Self::Failed(_) => "Failed",
            Self::Json(_) => "Json",
            Self::Other(_) => "Other",
        }
    }
}

/// Invokes the tool behind one plan step
///
/// Implementations must treat `prior` as read-only input: it holds the
/// results of every earlier parallel group.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, step: &ExecutionStep, ctx: &RunContext, prior: &StepResults) -> Result<Value, ToolError>;
}

/// One concrete tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool name (matches `ExecutionStep::tool_name`)
    fn name(&self) -> &str;

    async fn run(&self, step: &ExecutionStep, ctx: &RunContext, prior: &StepResults) -> Result<Value, ToolError>;
}
