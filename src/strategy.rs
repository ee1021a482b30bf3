//! Orchestrator strategy - wires detector, planner, runner and synthesizer.
//!
//! `execute` either commits a complete result to the workflow state
//! (response, plan, results and summary together) or leaves those fields
//! untouched and records an [`OrchestrationFailure`]. Errors and panics from
//! the components never escape.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;

use crate::config::Config;
use crate::detector::{IntentDetector, KeywordDetector};
use crate::domain::{
    ERROR_METADATA_KEY, ExecutionPlan, ExecutionSummary, OrchestrationFailure, OrchestrationStage, PLAN_METADATA_KEY,
    RESULTS_METADATA_KEY, SUMMARY_METADATA_KEY, StepResults, WorkflowState,
};
use crate::id::generate_trace_id;
use crate::planner::{ExecutionPlanner, Planner};
use crate::runner::{ExecutionRunner, PlanExecutor};
use crate::synthesis::{ResultSynthesizer, Synthesizer};
use crate::tools::ToolRegistry;

/// A way of answering a query inside the surrounding workflow
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this strategy should take the query
    fn can_handle(&self, query: &str) -> bool;

    /// Answer the query carried by `state`
    async fn execute(&self, state: WorkflowState) -> WorkflowState;
}

/// Strategy for queries that need several tool invocations.
pub struct MultiToolStrategy<D, P, E, S>
where
    D: IntentDetector,
    P: Planner,
    E: PlanExecutor,
    S: Synthesizer,
{
    detector: Arc<D>,
    planner: Arc<P>,
    executor: Arc<E>,
    synthesizer: Arc<S>,
}

/// Strategy built from the crate's own components.
pub type DefaultStrategy = MultiToolStrategy<KeywordDetector, ExecutionPlanner, ExecutionRunner<ToolRegistry>, ResultSynthesizer>;

/// Everything a successful run commits to the state.
struct Outcome {
    response: String,
    plan: Value,
    results: Value,
    summary: Value,
}

type StageResult<T> = std::result::Result<T, OrchestrationFailure>;

impl<D, P, E, S> MultiToolStrategy<D, P, E, S>
where
    D: IntentDetector,
    P: Planner,
    E: PlanExecutor,
    S: Synthesizer,
{
    pub fn new(detector: Arc<D>, planner: Arc<P>, executor: Arc<E>, synthesizer: Arc<S>) -> Self {
        Self {
            detector,
            planner,
            executor,
            synthesizer,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    async fn run(&self, state: &WorkflowState) -> StageResult<Outcome> {
        let ctx = state.run_context();
        let query = state.query.as_str();

        let intent = guard(OrchestrationStage::Detection, || self.detector.extract_intent(query))?;
        tracing::debug!(trace_id = %ctx.trace_id, tools = intent.tools().len(), "Intent extracted");

        let plan = guard(OrchestrationStage::Planning, || self.planner.plan(query, &intent))?
            .map_err(|e| failure(OrchestrationStage::Planning, e.to_string()))?;

        let results = AssertUnwindSafe(self.executor.execute(&plan, &ctx))
            .catch_unwind()
            .await
            .map_err(|_| failure(OrchestrationStage::Execution, "executor panicked"))?
            .map_err(|e| failure(OrchestrationStage::Execution, e.to_string()))?;

        let response = AssertUnwindSafe(self.synthesizer.synthesize(query, &plan, &results, &ctx))
            .catch_unwind()
            .await
            .map_err(|_| failure(OrchestrationStage::Synthesis, "synthesizer panicked"))?;

        to_outcome(response, &plan, &results)
    }
}

impl DefaultStrategy {
    /// Build the default component stack from configuration and a tool registry.
    pub fn from_config(config: &Config, registry: ToolRegistry) -> Self {
        Self::new(
            Arc::new(KeywordDetector::new()),
            Arc::new(ExecutionPlanner::from_config(&config.planner)),
            Arc::new(ExecutionRunner::from_config(Arc::new(registry), &config.runner)),
            Arc::new(ResultSynthesizer::from_config(&config.synthesis)),
        )
    }
}

#[async_trait]
impl<D, P, E, S> Strategy for MultiToolStrategy<D, P, E, S>
where
    D: IntentDetector,
    P: Planner,
    E: PlanExecutor,
    S: Synthesizer,
{
    fn name(&self) -> &str {
        "multi_tool"
    }

    fn can_handle(&self, query: &str) -> bool {
        catch_unwind(AssertUnwindSafe(|| self.detector.is_multi_tool(query))).unwrap_or(false)
    }

    async fn execute(&self, mut state: WorkflowState) -> WorkflowState {
        if state.trace_id.trim().is_empty() {
            state.trace_id = generate_trace_id();
        }
        match self.run(&state).await {
            Ok(outcome) => {
                state.metadata.insert(PLAN_METADATA_KEY.to_string(), outcome.plan);
                state.metadata.insert(RESULTS_METADATA_KEY.to_string(), outcome.results);
                state.metadata.insert(SUMMARY_METADATA_KEY.to_string(), outcome.summary);
                state.metadata.remove(ERROR_METADATA_KEY);
                state.response = Some(outcome.response);
                state.error = None;
                tracing::info!(trace_id = %state.trace_id, "Multi-tool query answered");
            }
            Err(err) => {
                tracing::error!(trace_id = %state.trace_id, stage = ?err.stage, error = %err.message, "Multi-tool query failed");
                if let Ok(value) = serde_json::to_value(&err) {
                    state.metadata.insert(ERROR_METADATA_KEY.to_string(), value);
                }
                state.error = Some(err);
            }
        }
        state
    }
}

fn failure(stage: OrchestrationStage, message: impl Into<String>) -> OrchestrationFailure {
    OrchestrationFailure {
        stage,
        message: message.into(),
    }
}

/// Run a synchronous stage, turning a panic into a stage failure.
fn guard<T>(stage: OrchestrationStage, f: impl FnOnce() -> T) -> StageResult<T> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|_| failure(stage, format!("{:?} stage panicked", stage)))
}

fn to_outcome(response: String, plan: &ExecutionPlan, results: &StepResults) -> StageResult<Outcome> {
    let encode = |e: serde_json::Error| failure(OrchestrationStage::Synthesis, format!("Failed to encode metadata: {}", e));
    Ok(Outcome {
        response,
        plan: serde_json::to_value(plan).map_err(encode)?,
        results: serde_json::to_value(results).map_err(encode)?,
        summary: serde_json::to_value(ExecutionSummary::from_results(results)).map_err(encode)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionStep, FailureKind, Intent, RunContext, StepResult, ToolName};
    use crate::error::{OrchestrationError, Result};
    use crate::synthesis::{FnGenerator, GenerationError};
    use crate::tools::{ToolError, ToolInvoker};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoInvoker;

    #[async_trait]
    impl ToolInvoker for EchoInvoker {
        async fn invoke(&self, step: &ExecutionStep, _ctx: &RunContext, _prior: &StepResults) -> std::result::Result<Value, ToolError> {
            if step.tool_name == "compare_wells" {
                return Err(ToolError::Failed("boom".into()));
            }
            Ok(json!({ "tool": step.tool_name }))
        }
    }

    /// Records the trace id each step was invoked with.
    #[derive(Default)]
    struct TraceRecorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ToolInvoker for TraceRecorder {
        async fn invoke(&self, _step: &ExecutionStep, ctx: &RunContext, _prior: &StepResults) -> std::result::Result<Value, ToolError> {
            self.seen.lock().unwrap().push(ctx.trace_id.clone());
            Ok(json!("ok"))
        }
    }

    /// Planner that always produces a cyclic plan error.
    struct CyclicPlanner;

    impl Planner for CyclicPlanner {
        fn plan(&self, _query: &str, _intent: &Intent) -> Result<ExecutionPlan> {
            Err(OrchestrationError::CyclicDependencies(vec![2, 3]))
        }
    }

    /// Executor that counts calls and returns a fixed map.
    struct CountingExecutor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PlanExecutor for CountingExecutor {
        async fn execute(&self, plan: &ExecutionPlan, _ctx: &RunContext) -> Result<StepResults> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(plan
                .steps()
                .iter()
                .map(|s| (s.step_id, StepResult::success(s.step_id, s.tool_name.clone(), json!("ok"), 0)))
                .collect())
        }
    }

    struct ShutdownExecutor;

    #[async_trait]
    impl PlanExecutor for ShutdownExecutor {
        async fn execute(&self, _plan: &ExecutionPlan, _ctx: &RunContext) -> Result<StepResults> {
            Err(OrchestrationError::PoolShutdown)
        }
    }

    struct StaticSynthesizer(&'static str);

    #[async_trait]
    impl Synthesizer for StaticSynthesizer {
        async fn synthesize(&self, _q: &str, _p: &ExecutionPlan, _r: &StepResults, _c: &RunContext) -> String {
            self.0.to_string()
        }
    }

    struct PanickingDetector;

    impl IntentDetector for PanickingDetector {
        fn is_multi_tool(&self, _query: &str) -> bool {
            panic!("detector bug")
        }

        fn extract_intent(&self, _query: &str) -> Intent {
            panic!("detector bug")
        }
    }

    fn real_strategy() -> MultiToolStrategy<KeywordDetector, ExecutionPlanner, ExecutionRunner<EchoInvoker>, ResultSynthesizer> {
        MultiToolStrategy::new(
            Arc::new(KeywordDetector::new()),
            Arc::new(ExecutionPlanner::new()),
            Arc::new(ExecutionRunner::new(Arc::new(EchoInvoker))),
            Arc::new(ResultSynthesizer::new()),
        )
    }

    #[tokio::test]
    async fn test_success_commits_response_and_metadata() {
        let strategy = real_strategy();
        let query = "Validate wells 15/9-13 and 16/1-2, then compare them";
        assert!(strategy.can_handle(query));

        let state = strategy.execute(WorkflowState::with_trace_id(query, "trace-1")).await;
        assert!(!state.is_failed());
        let response = state.response.as_deref().unwrap();
        assert!(!response.is_empty());
        assert!(response.contains("boom"));

        let plan = &state.metadata[PLAN_METADATA_KEY];
        assert_eq!(plan["steps"].as_array().unwrap().len(), 3);
        let results = state.metadata[RESULTS_METADATA_KEY].as_object().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results["3"]["status"], "failure");
        assert_eq!(results["3"]["kind"], "exception");
        assert_eq!(state.metadata[SUMMARY_METADATA_KEY]["succeeded"], 2);
        assert!(!state.metadata.contains_key(ERROR_METADATA_KEY));
    }

    #[tokio::test]
    async fn test_missing_trace_id_is_generated_and_propagated() {
        let recorder = Arc::new(TraceRecorder::default());
        let strategy = MultiToolStrategy::new(
            Arc::new(KeywordDetector::new()),
            Arc::new(ExecutionPlanner::new()),
            Arc::new(ExecutionRunner::new(Arc::clone(&recorder))),
            Arc::new(StaticSynthesizer("done")),
        );
        let state = strategy
            .execute(WorkflowState {
                query: "validate 15/9-13".to_string(),
                ..Default::default()
            })
            .await;

        assert!(!state.is_failed());
        assert!(state.trace_id.starts_with("trace-"));
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], state.trace_id);
    }

    #[tokio::test]
    async fn test_caller_trace_id_is_kept() {
        let recorder = Arc::new(TraceRecorder::default());
        let strategy = MultiToolStrategy::new(
            Arc::new(KeywordDetector::new()),
            Arc::new(ExecutionPlanner::new()),
            Arc::new(ExecutionRunner::new(Arc::clone(&recorder))),
            Arc::new(StaticSynthesizer("done")),
        );
        let state = strategy
            .execute(WorkflowState::with_trace_id("validate 15/9-13", "trace-caller"))
            .await;
        assert_eq!(state.trace_id, "trace-caller");
        assert_eq!(recorder.seen.lock().unwrap().as_slice(), ["trace-caller".to_string()]);
    }

    #[tokio::test]
    async fn test_generator_response_is_used() {
        let generator = FnGenerator::new(|prompt: &str| {
            if prompt.contains("[step 1]") {
                Ok("All wells look fine.".to_string())
            } else {
                Err(GenerationError::Failed("no steps".into()))
            }
        });
        let strategy = MultiToolStrategy::new(
            Arc::new(KeywordDetector::new()),
            Arc::new(ExecutionPlanner::new()),
            Arc::new(ExecutionRunner::new(Arc::new(EchoInvoker))),
            Arc::new(ResultSynthesizer::new().with_generator(Arc::new(generator))),
        );
        let state = strategy.execute(WorkflowState::new("validate and export 15/9-13")).await;
        assert_eq!(state.response.as_deref(), Some("All wells look fine."));
    }

    #[tokio::test]
    async fn test_planning_error_leaves_state_untouched() {
        let executor = Arc::new(CountingExecutor {
            calls: AtomicUsize::new(0),
        });
        let strategy = MultiToolStrategy::new(
            Arc::new(KeywordDetector::new()),
            Arc::new(CyclicPlanner),
            Arc::clone(&executor),
            Arc::new(StaticSynthesizer("unused")),
        );
        let mut input = WorkflowState::with_trace_id("validate 15/9-13", "trace-2");
        input.metadata.insert("caller".into(), json!(true));

        let state = strategy.execute(input).await;
        assert!(state.response.is_none());
        assert!(!state.metadata.contains_key(PLAN_METADATA_KEY));
        assert!(!state.metadata.contains_key(RESULTS_METADATA_KEY));
        assert_eq!(state.metadata["caller"], json!(true));

        let error = state.error.unwrap();
        assert_eq!(error.stage, OrchestrationStage::Planning);
        assert!(error.message.contains("Cyclic"));
        assert_eq!(state.metadata[ERROR_METADATA_KEY]["stage"], "planning");
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execution_error_becomes_error_state() {
        let strategy = MultiToolStrategy::new(
            Arc::new(KeywordDetector::new()),
            Arc::new(ExecutionPlanner::new()),
            Arc::new(ShutdownExecutor),
            Arc::new(StaticSynthesizer("unused")),
        );
        let state = strategy.execute(WorkflowState::new("validate and compare 15/9-13")).await;
        assert!(state.response.is_none());
        assert_eq!(state.error.unwrap().stage, OrchestrationStage::Execution);
    }

    #[tokio::test]
    async fn test_detector_panic_is_contained() {
        let strategy = MultiToolStrategy::new(
            Arc::new(PanickingDetector),
            Arc::new(ExecutionPlanner::new()),
            Arc::new(ShutdownExecutor),
            Arc::new(StaticSynthesizer("unused")),
        );
        assert!(!strategy.can_handle("anything"));
        let state = strategy.execute(WorkflowState::new("anything")).await;
        assert_eq!(state.error.unwrap().stage, OrchestrationStage::Detection);
    }

    #[tokio::test]
    async fn test_uses_injected_components() {
        let executor = Arc::new(CountingExecutor {
            calls: AtomicUsize::new(0),
        });
        let strategy = MultiToolStrategy::new(
            Arc::new(KeywordDetector::new()),
            Arc::new(ExecutionPlanner::new()),
            Arc::clone(&executor),
            Arc::new(StaticSynthesizer("stubbed answer")),
        );
        let state = strategy.execute(WorkflowState::new("validate 15/9-13")).await;
        assert_eq!(state.response.as_deref(), Some("stubbed answer"));
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(strategy.name(), "multi_tool");
    }

    #[tokio::test]
    async fn test_empty_intent_still_answers() {
        let strategy = real_strategy();
        let state = strategy.execute(WorkflowState::new("")).await;
        assert!(!state.is_failed());
        assert!(!state.response.unwrap().is_empty());
        let plan = &state.metadata[PLAN_METADATA_KEY];
        assert_eq!(plan["steps"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_default_strategy_from_config() {
        let strategy = DefaultStrategy::from_config(&Config::default(), ToolRegistry::dry_run());
        assert_eq!(strategy.executor().pool().width(), 4);
        let state = strategy.execute(WorkflowState::new("compute stats for all wells")).await;
        let results = state.metadata[RESULTS_METADATA_KEY].as_object().unwrap();
        assert!(results.values().all(|r| r["status"] == "success"));
    }

    #[test]
    fn test_outcome_encoding() {
        let plan = ExecutionPlan::new(
            "q",
            vec![ExecutionStep::new(1, ToolName::QueryWellData.as_str(), BTreeMap::new(), 10)],
        );
        let mut results = StepResults::new();
        results.insert(1, StepResult::failure(FailureKind::Timeout, 1, "query_well_data", "late"));
        let outcome = to_outcome("text".into(), &plan, &results).unwrap();
        assert_eq!(outcome.results["1"]["kind"], "timeout");
        assert_eq!(outcome.summary["timed_out"], 1);
    }
}
