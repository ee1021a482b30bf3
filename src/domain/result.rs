//! Per-step outcomes of plan execution.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a step did not produce a payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Still outstanding when its group's timeout fired
    Timeout,
    /// The invocation returned an error or panicked
    Exception,
    /// No handler is registered for the step's tool
    UnknownTool,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Exception => "exception",
            Self::UnknownTool => "unknown_tool",
        };
        f.write_str(s)
    }
}

/// Structured failure recorded in place of a payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
    pub step_id: u32,
    pub tool_name: String,
}

/// Outcome of one step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    Success {
        step_id: u32,
        tool_name: String,
        payload: Value,
        duration_ms: u64,
    },
    Failure(StepFailure),
}

impl StepResult {
    pub fn success(step_id: u32, tool_name: impl Into<String>, payload: Value, duration_ms: u64) -> Self {
        Self::Success {
            step_id,
            tool_name: tool_name.into(),
            payload,
            duration_ms,
        }
    }

    pub fn failure(kind: FailureKind, step_id: u32, tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure(StepFailure {
            kind,
            message: message.into(),
            step_id,
            tool_name: tool_name.into(),
        })
    }

    pub fn timeout(step_id: u32, tool_name: impl Into<String>, timeout_ms: u64) -> Self {
        Self::failure(
            FailureKind::Timeout,
            step_id,
            tool_name,
            format!("Step did not finish within the {}ms group timeout", timeout_ms),
        )
    }

    pub fn step_id(&self) -> u32 {
        match self {
            Self::Success { step_id, .. } => *step_id,
            Self::Failure(f) => f.step_id,
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            Self::Success { tool_name, .. } => tool_name,
            Self::Failure(f) => &f.tool_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Payload of a successful step.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure(_) => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(f) => Some(f.kind),
        }
    }
}

/// Results keyed by step id.
pub type StepResults = BTreeMap<u32, StepResult>;

/// Counts over a result map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub unknown_tools: usize,
}

impl ExecutionSummary {
    pub fn from_results(results: &StepResults) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results.values() {
            match result.failure_kind() {
                None => summary.succeeded += 1,
                Some(FailureKind::Exception) => summary.failed += 1,
                Some(FailureKind::Timeout) => summary.timed_out += 1,
                Some(FailureKind::UnknownTool) => summary.unknown_tools += 1,
            }
        }
        summary
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}
