//! Execution runner module - runs plans on a bounded worker pool.
//!
//! This module provides:
//! - [`WorkerPool`], the slot budget shared by all steps of a runner
//! - [`ExecutionRunner`], which runs parallel groups in ascending order
//! - [`PlanExecutor`], the seam the strategy depends on

mod execution_runner;
mod pool;

pub use execution_runner::{DEFAULT_GROUP_TIMEOUT, ExecutionRunner, PlanExecutor};
pub use pool::{DEFAULT_MAX_WORKERS, WorkerPool};
