//! Dry-run tool: echoes what it was asked to do instead of doing it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ToolError, ToolHandler};
use crate::domain::{ExecutionStep, RunContext, StepResults};

/// Handler that reports its step, parameters and upstream status.
#[derive(Debug, Clone)]
pub struct DryRunTool {
    name: String,
    delay: Option<Duration>,
}

impl DryRunTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay: None,
        }
    }

    /// Sleep before answering, to simulate tool latency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ToolHandler for DryRunTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, step: &ExecutionStep, ctx: &RunContext, prior: &StepResults) -> Result<Value, ToolError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let upstream: Vec<Value> = step
            .depends_on
            .iter()
            .map(|dep| {
                let status = match prior.get(dep) {
                    Some(result) if result.is_success() => "ok",
                    Some(_) => "failed",
                    None => "missing",
                };
                json!({ "step_id": dep, "status": status })
            })
            .collect();

        Ok(json!({
            "tool": self.name,
            "step_id": step.step_id,
            "parameters": step.parameters,
            "upstream": upstream,
            "trace_id": ctx.trace_id,
            "dry_run": true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureKind, StepResult};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_reports_step_and_upstream() {
        let mut params = BTreeMap::new();
        params.insert("well_id".to_string(), json!("15/9-13"));
        let mut step = ExecutionStep::new(3, "compare_wells", params, 10);
        step.depends_on = [1, 2, 4].into_iter().collect();

        let mut prior = StepResults::new();
        prior.insert(1, StepResult::success(1, "validate_well_data", json!(null), 1));
        prior.insert(2, StepResult::failure(FailureKind::Exception, 2, "validate_well_data", "boom"));

        let ctx = RunContext::new("trace-7", "compare");
        let out = DryRunTool::new("compare_wells").run(&step, &ctx, &prior).await.unwrap();

        assert_eq!(out["tool"], "compare_wells");
        assert_eq!(out["step_id"], 3);
        assert_eq!(out["trace_id"], "trace-7");
        assert_eq!(out["parameters"]["well_id"], "15/9-13");
        assert_eq!(out["upstream"][0]["status"], "ok");
        assert_eq!(out["upstream"][1]["status"], "failed");
        assert_eq!(out["upstream"][2]["status"], "missing");
    }
}
