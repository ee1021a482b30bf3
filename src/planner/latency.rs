//! Per-tool latency estimates.

use std::collections::BTreeMap;

use crate::config::PlannerConfig;
use crate::domain::ToolName;

/// Built-in estimate for a known tool, in milliseconds.
pub fn default_latency_ms(tool: ToolName) -> u64 {
    match tool {
        ToolName::QueryWellData => 1000,
        ToolName::ValidateWellData => 2000,
        ToolName::ComputeStatistics => 1500,
        ToolName::CompareWells => 3000,
        ToolName::ExportResults => 1000,
        ToolName::SummarizeResults => 1200,
    }
}

/// Lookup table: configured overrides, then built-ins, then a fallback.
#[derive(Debug, Clone)]
pub struct LatencyTable {
    overrides: BTreeMap<String, u64>,
    fallback_ms: u64,
}

impl LatencyTable {
    pub fn new(fallback_ms: u64) -> Self {
        Self {
            overrides: BTreeMap::new(),
            fallback_ms: fallback_ms.max(1),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        let mut table = Self::new(config.default_latency_ms);
        for (tool, ms) in &config.latency_overrides {
            table = table.with_override(tool, *ms);
        }
        table
    }

    /// Replace the estimate for one tool. Zero is clamped to 1ms.
    pub fn with_override(mut self, tool: impl Into<String>, ms: u64) -> Self {
        self.overrides.insert(tool.into(), ms.max(1));
        self
    }

    pub fn estimate(&self, tool_name: &str) -> u64 {
        if let Some(ms) = self.overrides.get(tool_name) {
            return *ms;
        }
        tool_name
            .parse::<ToolName>()
            .map(default_latency_ms)
            .unwrap_or(self.fallback_ms)
    }
}

impl Default for LatencyTable {
    fn default() -> Self {
        Self::from_config(&PlannerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_estimates() {
        let table = LatencyTable::default();
        assert_eq!(table.estimate("validate_well_data"), 2000);
        assert_eq!(table.estimate("compare_wells"), 3000);
    }

    #[test]
    fn test_unknown_tool_uses_fallback() {
        let table = LatencyTable::new(750);
        assert_eq!(table.estimate("core_photo_lookup"), 750);
    }

    #[test]
    fn test_override_wins() {
        let table = LatencyTable::default().with_override("compare_wells", 4500);
        assert_eq!(table.estimate("compare_wells"), 4500);
        assert_eq!(table.estimate("export_results"), 1000);
    }

    #[test]
    fn test_estimates_are_positive() {
        let table = LatencyTable::new(0).with_override("export_results", 0);
        assert_eq!(table.estimate("unknown"), 1);
        assert_eq!(table.estimate("export_results"), 1);
        for tool in ToolName::ALL {
            assert!(table.estimate(tool.as_str()) > 0);
        }
    }

    #[test]
    fn test_from_config() {
        let mut config = PlannerConfig::default();
        config.default_latency_ms = 900;
        config.latency_overrides.insert("summarize_results".into(), 2500);
        let table = LatencyTable::from_config(&config);
        assert_eq!(table.estimate("summarize_results"), 2500);
        assert_eq!(table.estimate("mystery"), 900);
    }
}
