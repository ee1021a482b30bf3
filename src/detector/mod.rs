//! Intent Detector - decides whether a query needs multi-tool handling
//!
//! Detection and extraction are total functions over arbitrary text: they
//! never fail and always return a value satisfying their output contract.

mod keyword;
mod vocabulary;

pub use keyword::{DetectionSignals, KeywordDetector};
pub use vocabulary::{Action, DEFAULT_TOOL};

use crate::domain::Intent;

/// Classifies queries and extracts structured intent from them
pub trait IntentDetector: Send + Sync {
    /// Whether the query implies more than one tool invocation
    fn is_multi_tool(&self, query: &str) -> bool;

    /// Extract tools, parameters and recognized actions from the query
    fn extract_intent(&self, query: &str) -> Intent;
}
