//! Workflow state carried through a request, and the per-call run context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::generate_trace_id;

/// Metadata key for the serialized execution plan.
pub const PLAN_METADATA_KEY: &str = "multi_tool_plan";
/// Metadata key for the serialized step results.
pub const RESULTS_METADATA_KEY: &str = "tool_results";
/// Metadata key for the execution summary counts.
pub const SUMMARY_METADATA_KEY: &str = "multi_tool_summary";
/// Metadata key for a failed orchestration.
pub const ERROR_METADATA_KEY: &str = "orchestration_error";

/// Context propagated into every step invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub trace_id: String,
    pub query: String,
}

impl RunContext {
    pub fn new(trace_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            query: query.into(),
        }
    }
}

/// Orchestration stage that failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationStage {
    Detection,
    Planning,
    Execution,
    Synthesis,
}

/// Structured error left on a workflow state when orchestration fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestrationFailure {
    pub stage: OrchestrationStage,
    pub message: String,
}

/// State of one request as it moves through the surrounding workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    pub query: String,
    pub trace_id: String,
    pub metadata: HashMap<String, Value>,
    pub response: Option<String>,
    pub error: Option<OrchestrationFailure>,
}

impl WorkflowState {
    /// New state for a query with a freshly generated trace id.
    pub fn new(query: impl Into<String>) -> Self {
        Self::with_trace_id(query, generate_trace_id())
    }

    pub fn with_trace_id(query: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            trace_id: trace_id.into(),
            ..Self::default()
        }
    }

    /// Context for running this state's query.
    pub fn run_context(&self) -> RunContext {
        RunContext::new(self.trace_id.clone(), self.query.clone())
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
