//! Generator-backed synthesizer with a deterministic fallback.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use super::Synthesizer;
use super::generator::TextGenerator;
use super::prompt::{build_prompt, render_fallback};
use crate::config::SynthesisConfig;
use crate::domain::{ExecutionPlan, RunContext, StepResults};

/// Default cap on payload characters per step in prompts and fallback text.
pub const DEFAULT_MAX_PAYLOAD_CHARS: usize = 2000;

pub struct ResultSynthesizer {
    generator: Option<Arc<dyn TextGenerator>>,
    max_payload_chars: usize,
}

impl Default for ResultSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSynthesizer {
    /// Synthesizer with no generator; always uses the fallback template.
    pub fn new() -> Self {
        Self {
            generator: None,
            max_payload_chars: DEFAULT_MAX_PAYLOAD_CHARS,
        }
    }

    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self::new().with_max_payload_chars(config.max_payload_chars)
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_max_payload_chars(mut self, max_payload_chars: usize) -> Self {
        self.max_payload_chars = max_payload_chars.max(1);
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Generator output, or `None` when the fallback should be used.
    async fn try_generate(&self, query: &str, results: &StepResults, ctx: &RunContext) -> Option<String> {
        let generator = self.generator.as_ref()?;
        let prompt = build_prompt(query, results, self.max_payload_chars);

        match AssertUnwindSafe(generator.generate(&prompt)).catch_unwind().await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
            Ok(Ok(_)) => {
                tracing::warn!(trace_id = %ctx.trace_id, "Generator returned blank text, using fallback");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(trace_id = %ctx.trace_id, error = %e, "Generator failed, using fallback");
                None
            }
            Err(_) => {
                tracing::error!(trace_id = %ctx.trace_id, "Generator panicked, using fallback");
                None
            }
        }
    }
}

#[async_trait]
impl Synthesizer for ResultSynthesizer {
    async fn synthesize(&self, query: &str, plan: &ExecutionPlan, results: &StepResults, ctx: &RunContext) -> String {
        if let Some(text) = self.try_generate(query, results, ctx).await {
            tracing::debug!(trace_id = %ctx.trace_id, chars = text.len(), "Synthesized with generator");
            return text;
        }
        render_fallback(query, plan, results, self.max_payload_chars)
    }
}
