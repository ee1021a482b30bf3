//! Domain types for wellflow
//!
//! This module contains the data that flows between components:
//! - ToolName: the closed tool vocabulary
//! - Intent: tools, parameters and actions extracted from a query
//! - ExecutionStep / ExecutionPlan: the scheduled work
//! - StepResult: per-step success or structured failure
//! - WorkflowState / RunContext: the caller's request state and per-call context

pub mod intent;
pub mod plan;
pub mod result;
pub mod state;
pub mod tool;

pub use intent::{Intent, WELL_ID_PARAM, WELL_IDS_PARAM};
pub use plan::{ExecutionPlan, ExecutionStep};
pub use result::{ExecutionSummary, FailureKind, StepFailure, StepResult, StepResults};
pub use state::{
    ERROR_METADATA_KEY, OrchestrationFailure, OrchestrationStage, PLAN_METADATA_KEY, RESULTS_METADATA_KEY,
    RunContext, SUMMARY_METADATA_KEY, WorkflowState,
};
pub use tool::ToolName;
