//! Text generation seam used by the synthesizer's primary path.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a generator can return
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Backend not configured or not reachable
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    /// Backend answered but the call failed
    #[error("Generation failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] eyre::Report),
}

/// Produces text from a prompt (an LLM, a template engine, a test double)
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Adapts a plain closure into a [`TextGenerator`].
pub struct FnGenerator<F>
where
    F: Fn(&str) -> Result<String, GenerationError> + Send + Sync,
{
    func: F,
}

impl<F> FnGenerator<F>
where
    F: Fn(&str) -> Result<String, GenerationError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> TextGenerator for FnGenerator<F>
where
    F: Fn(&str) -> Result<String, GenerationError> + Send + Sync,
{
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (self.func)(prompt)
    }
}
