//! Helpers for tools that consume the output of their dependencies.

use serde_json::Value;

use super::ToolError;
use crate::domain::{ExecutionStep, StepResult, StepResults};

/// Payloads of every step `step` depends on, in step-id order.
///
/// Fails on the first dependency that is missing from `prior` or that
/// finished with a failure, so aggregating tools can refuse partial input.
pub fn upstream_payloads<'a>(step: &ExecutionStep, prior: &'a StepResults) -> Result<Vec<(u32, &'a Value)>, ToolError> {
    step.depends_on
        .iter()
        .map(|dep| match prior.get(dep) {
            None => Err(ToolError::MissingUpstream(*dep)),
            Some(StepResult::Failure(failure)) => Err(ToolError::UpstreamFailed {
                step_id: *dep,
                message: failure.message.clone(),
            }),
            Some(StepResult::Success { payload, .. }) => Ok((*dep, payload)),
        })
        .collect()
}
