use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OrchestrationError, Result};
use crate::runner::{DEFAULT_GROUP_TIMEOUT, DEFAULT_MAX_WORKERS};
use crate::synthesis::DEFAULT_MAX_PAYLOAD_CHARS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub runner: RunnerConfig,
    pub planner: PlannerConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Width of the worker pool
    pub max_workers: usize,
    /// How long one parallel group may run before outstanding steps time out
    pub group_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            group_timeout_ms: DEFAULT_GROUP_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Latency assumed for tools missing from the latency table
    pub default_latency_ms: u64,
    /// Per-tool latency estimates replacing the built-in table
    pub latency_overrides: BTreeMap<String, u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_latency_ms: 1000,
            latency_overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Payloads longer than this are truncated in prompts and fallback text
    pub max_payload_chars: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_payload_chars: DEFAULT_MAX_PAYLOAD_CHARS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            runner: RunnerConfig::default(),
            planner: PlannerConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject values the runner and planner cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.runner.max_workers == 0 {
            return Err(OrchestrationError::Config("runner.max_workers must be > 0".into()));
        }
        if self.runner.group_timeout_ms == 0 {
            return Err(OrchestrationError::Config("runner.group_timeout_ms must be > 0".into()));
        }
        if self.planner.default_latency_ms == 0 {
            return Err(OrchestrationError::Config("planner.default_latency_ms must be > 0".into()));
        }
        if let Some((tool, _)) = self.planner.latency_overrides.iter().find(|(_, ms)| **ms == 0) {
            return Err(OrchestrationError::Config(format!(
                "planner.latency_overrides.{} must be > 0",
                tool
            )));
        }
        Ok(())
    }
}
