//! Result Synthesizer - turns keyed step results into one response
//!
//! The primary path hands a compact prompt to a [`TextGenerator`]. When no
//! generator is configured, or it errors, panics or returns blank text, a
//! deterministic template is rendered instead. Synthesis never fails.

mod generator;
mod prompt;
mod result_synthesizer;

pub use generator::{FnGenerator, GenerationError, TextGenerator};
pub use prompt::{NO_RESULTS, build_prompt, render_fallback};
pub use result_synthesizer::{DEFAULT_MAX_PAYLOAD_CHARS, ResultSynthesizer};

use async_trait::async_trait;

use crate::domain::{ExecutionPlan, RunContext, StepResults};

/// Produces the final response for a run
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Always returns non-empty text.
    async fn synthesize(&self, query: &str, plan: &ExecutionPlan, results: &StepResults, ctx: &RunContext) -> String;
}
