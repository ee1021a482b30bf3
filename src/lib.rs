//! Wellflow - multi-tool query orchestration for well-data requests
//!
//! A query flows strictly downstream through four components:
//! detector (intent) -> planner (dependency-aware plan) -> runner (bounded,
//! group-ordered execution) -> synthesizer (one response). The
//! [`strategy::MultiToolStrategy`] composes them over a caller's workflow state.

pub mod config;
pub mod detector;
pub mod domain;
pub mod error;
pub mod id;
pub mod planner;
pub mod runner;
pub mod strategy;
pub mod synthesis;
pub mod tools;

pub use error::{OrchestrationError, Result};
