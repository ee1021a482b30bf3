//! Execution runner - runs a plan group by group on a bounded worker pool.
//!
//! Each parallel group is spawned into a `JoinSet`; every step waits for a
//! pool slot, sees a read-only snapshot of all earlier groups' results, and
//! always yields exactly one [`StepResult`]:
//! - `Ok` from the tool becomes a success with its duration
//! - `ToolError::UnknownTool` becomes an `unknown_tool` failure
//! - any other error or a panic becomes an `exception` failure
//! - a step still outstanding when the group timeout fires is aborted and
//!   recorded as a `timeout` failure

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::pool::WorkerPool;
use crate::config::RunnerConfig;
use crate::domain::{ExecutionPlan, ExecutionStep, FailureKind, RunContext, StepResult, StepResults};
use crate::error::{OrchestrationError, Result};
use crate::tools::{ToolError, ToolInvoker};

/// Default time a parallel group may run before its stragglers time out.
pub const DEFAULT_GROUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes plans and returns one result per step
#[async_trait]
pub trait PlanExecutor: Send + Sync {
    /// Run every step of `plan`.
    ///
    /// Only a malformed plan or a shut-down pool is an error; step-level
    /// problems are recorded in the returned map.
    async fn execute(&self, plan: &ExecutionPlan, ctx: &RunContext) -> Result<StepResults>;
}

/// Group-ordered plan executor.
pub struct ExecutionRunner<T>
where
    T: ToolInvoker + 'static,
{
    /// Tool invocation seam
    invoker: Arc<T>,
    /// Bounded pool owned by this runner
    pool: WorkerPool,
    /// Per-group wait limit
    group_timeout: Duration,
}

impl<T> ExecutionRunner<T>
where
    T: ToolInvoker + 'static,
{
    /// Create a runner with the default pool width and group timeout.
    pub fn new(invoker: Arc<T>) -> Self {
        Self {
            invoker,
            pool: WorkerPool::default(),
            group_timeout: DEFAULT_GROUP_TIMEOUT,
        }
    }

    /// Create a runner from configuration.
    pub fn from_config(invoker: Arc<T>, config: &RunnerConfig) -> Self {
        Self {
            invoker,
            pool: WorkerPool::new(config.max_workers),
            group_timeout: Duration::from_millis(config.group_timeout_ms),
        }
    }

    /// Replace the worker pool with one of the given width.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.pool = WorkerPool::new(max_workers);
        self
    }

    pub fn with_group_timeout(mut self, timeout: Duration) -> Self {
        self.group_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn group_timeout(&self) -> Duration {
        self.group_timeout
    }

    /// Release the worker pool. Later executions fail with `PoolShutdown`.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    /// Run one group to completion or timeout.
    async fn run_group(
        &self,
        group: u32,
        steps: &[&ExecutionStep],
        prior: Arc<StepResults>,
        ctx: &Arc<RunContext>,
    ) -> StepResults {
        let mut set = JoinSet::new();
        for step in steps {
            let invoker = Arc::clone(&self.invoker);
            let permits = self.pool.permits();
            let step = (*step).clone();
            let prior = Arc::clone(&prior);
            let ctx = Arc::clone(ctx);
            set.spawn(async move { run_step(invoker, permits, step, ctx, prior).await });
        }

        let mut finished = StepResults::new();
        let drained = tokio::time::timeout(self.group_timeout, async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(result) => {
                        finished.insert(result.step_id(), result);
                    }
                    Err(e) => {
                        tracing::error!(trace_id = %ctx.trace_id, group, error = %e, "Step task ended abnormally");
                    }
                }
            }
        })
        .await;

        let timed_out = drained.is_err();
        if timed_out {
            // Stragglers are cancelled at their next await point; late results are dropped
            set.abort_all();
            tracing::warn!(
                trace_id = %ctx.trace_id,
                group,
                timeout_ms = self.group_timeout.as_millis() as u64,
                outstanding = steps.len() - finished.len(),
                "Group timed out"
            );
        }

        for step in steps {
            if finished.contains_key(&step.step_id) {
                continue;
            }
            let result = if timed_out {
                StepResult::timeout(step.step_id, &step.tool_name, self.group_timeout.as_millis() as u64)
            } else {
                StepResult::failure(
                    FailureKind::Exception,
                    step.step_id,
                    &step.tool_name,
                    "Step task ended without producing a result",
                )
            };
            finished.insert(step.step_id, result);
        }

        finished
    }
}

#[async_trait]
impl<T> PlanExecutor for ExecutionRunner<T>
where
    T: ToolInvoker + 'static,
{
    async fn execute(&self, plan: &ExecutionPlan, ctx: &RunContext) -> Result<StepResults> {
        if plan.is_empty() {
            return Ok(StepResults::new());
        }
        plan.validate()?;
        if self.pool.is_shutdown() {
            return Err(OrchestrationError::PoolShutdown);
        }

        let started = Instant::now();
        let shared_ctx = Arc::new(ctx.clone());
        let mut results = StepResults::new();

        for (group, steps) in plan.groups() {
            tracing::debug!(trace_id = %ctx.trace_id, group, steps = steps.len(), "Starting group");
            let snapshot = Arc::new(results.clone());
            let group_results = self.run_group(group, &steps, snapshot, &shared_ctx).await;
            results.extend(group_results);
        }

        let expected: BTreeSet<u32> = plan.step_ids().into_iter().collect();
        let recorded: BTreeSet<u32> = results.keys().copied().collect();
        if expected != recorded {
            return Err(OrchestrationError::PlanInvariant(format!(
                "result ids {:?} do not match plan step ids {:?}",
                recorded, expected
            )));
        }

        let failed = results.values().filter(|r| !r.is_success()).count();
        tracing::info!(
            trace_id = %ctx.trace_id,
            steps = results.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Plan executed"
        );
        Ok(results)
    }
}

/// Run one step inside its own task; never panics, never errors.
async fn run_step<T>(
    invoker: Arc<T>,
    permits: Arc<Semaphore>,
    step: ExecutionStep,
    ctx: Arc<RunContext>,
    prior: Arc<StepResults>,
) -> StepResult
where
    T: ToolInvoker + ?Sized,
{
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return StepResult::failure(
                FailureKind::Exception,
                step.step_id,
                &step.tool_name,
                "Worker pool shut down before the step started",
            );
        }
    };

    let started = Instant::now();
    let outcome = AssertUnwindSafe(invoker.invoke(&step, &ctx, &prior)).catch_unwind().await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(payload)) => {
            tracing::debug!(trace_id = %ctx.trace_id, step_id = step.step_id, tool = %step.tool_name, duration_ms, "Step succeeded");
            StepResult::success(step.step_id, step.tool_name, payload, duration_ms)
        }
        Ok(Err(ToolError::UnknownTool(name))) => {
            tracing::warn!(trace_id = %ctx.trace_id, step_id = step.step_id, tool = %name, "Unknown tool");
            StepResult::failure(
                FailureKind::UnknownTool,
                step.step_id,
                step.tool_name,
                format!("Unknown tool: {}", name),
            )
        }
        Ok(Err(e)) => {
            tracing::warn!(trace_id = %ctx.trace_id, step_id = step.step_id, tool = %step.tool_name, error = %e, "Step failed");
            StepResult::failure(
                FailureKind::Exception,
                step.step_id,
                step.tool_name,
                format!("{}: {}", e.kind_name(), e),
            )
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(trace_id = %ctx.trace_id, step_id = step.step_id, tool = %step.tool_name, panic = %message, "Step panicked");
            StepResult::failure(
                FailureKind::Exception,
                step.step_id,
                step.tool_name,
                format!("Panic: {}", message),
            )
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
