//! Tool registry - name to handler lookup and dispatch

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{DryRunTool, ToolError, ToolHandler, ToolInvoker};
use crate::domain::{ExecutionStep, RunContext, StepResults, ToolName};

/// Dispatches steps to registered handlers by tool name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a dry-run handler for every tool in the vocabulary
    pub fn dry_run() -> Self {
        let mut registry = Self::new();
        for tool in ToolName::ALL {
            registry.register(Arc::new(DryRunTool::new(tool.as_str())));
        }
        registry
    }

    /// Add or replace a handler
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl ToolInvoker for ToolRegistry {
    async fn invoke(&self, step: &ExecutionStep, ctx: &RunContext, prior: &StepResults) -> Result<Value, ToolError> {
        let handler = self
            .handlers
            .get(&step.tool_name)
            .ok_or_else(|| ToolError::UnknownTool(step.tool_name.clone()))?;
        handler.run(step, ctx, prior).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    struct Constant;

    #[async_trait]
    impl ToolHandler for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        async fn run(&self, _step: &ExecutionStep, _ctx: &RunContext, _prior: &StepResults) -> Result<Value, ToolError> {
            Ok(json!(42))
        }
    }

    fn ctx() -> RunContext {
        RunContext::new("trace-test", "q")
    }

    #[tokio::test]
    async fn test_dispatches_to_registered_handler() {
        let registry = ToolRegistry::new().with_handler(Arc::new(Constant));
        let step = ExecutionStep::new(1, "constant", BTreeMap::new(), 10);
        let value = registry.invoke(&step, &ctx(), &StepResults::new()).await.unwrap();
        assert_eq!(value, json!(42));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let step = ExecutionStep::new(1, "drill_well", BTreeMap::new(), 10);
        let err = registry.invoke(&step, &ctx(), &StepResults::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "drill_well"));
    }

    #[test]
    fn test_dry_run_registers_vocabulary() {
        let registry = ToolRegistry::dry_run();
        for tool in ToolName::ALL {
            assert!(registry.has_tool(tool.as_str()));
        }
        assert_eq!(registry.tool_names().len(), ToolName::ALL.len());
    }
}
