//! Tool vocabulary for well-data requests.
//!
//! The set of tools is closed: intent extraction only ever produces these
//! names, and the planner's dependency rules are keyed on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tools an intent can require.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Plain lookup; the default when no action verb is recognized
    QueryWellData,
    /// Quality checks on one well's curves
    ValidateWellData,
    /// Per-well descriptive statistics
    ComputeStatistics,
    /// Cross-well comparison over per-well outputs
    CompareWells,
    /// Export of everything computed before it
    ExportResults,
    /// Narrative summary of everything computed before it
    SummarizeResults,
}

impl ToolName {
    /// All tools in pipeline order.
    pub const ALL: [ToolName; 6] = [
        ToolName::QueryWellData,
        ToolName::ValidateWellData,
        ToolName::ComputeStatistics,
        ToolName::CompareWells,
        ToolName::ExportResults,
        ToolName::SummarizeResults,
    ];

    /// Wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryWellData => "query_well_data",
            Self::ValidateWellData => "validate_well_data",
            Self::ComputeStatistics => "compute_statistics",
            Self::CompareWells => "compare_wells",
            Self::ExportResults => "export_results",
            Self::SummarizeResults => "summarize_results",
        }
    }

    /// Position in the processing pipeline; producers rank before consumers.
    pub fn pipeline_rank(&self) -> u8 {
        match self {
            Self::QueryWellData => 0,
            Self::ValidateWellData => 1,
            Self::ComputeStatistics => 2,
            Self::CompareWells => 3,
            Self::ExportResults => 4,
            Self::SummarizeResults => 5,
        }
    }

    /// Whether the tool's natural granularity is one call per well.
    pub fn is_per_entity(&self) -> bool {
        matches!(self, Self::ValidateWellData | Self::ComputeStatistics)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|tool| tool.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}
