//! Structured intent extracted from a free-text request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tool::ToolName;

/// Parameter key holding the list of target well identifiers.
pub const WELL_IDS_PARAM: &str = "well_ids";

/// Parameter key holding a single target well identifier on a per-entity step.
pub const WELL_ID_PARAM: &str = "well_id";

/// What a request asks for: the tools to run, their parameters, and the
/// action verbs that were recognized. Built once per query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    tools: Vec<ToolName>,
    parameters: BTreeMap<String, Value>,
    actions: Vec<String>,
}

impl Intent {
    /// Create an intent from its parts.
    pub fn new(tools: Vec<ToolName>, parameters: BTreeMap<String, Value>, actions: Vec<String>) -> Self {
        Self {
            tools,
            parameters,
            actions,
        }
    }

    /// An intent that requires no tools.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convenience constructor for an intent targeting a set of wells.
    pub fn for_wells<S: AsRef<str>>(tools: Vec<ToolName>, well_ids: &[S]) -> Self {
        let mut parameters = BTreeMap::new();
        if !well_ids.is_empty() {
            let ids = well_ids.iter().map(|id| Value::String(id.as_ref().to_string())).collect();
            parameters.insert(WELL_IDS_PARAM.to_string(), Value::Array(ids));
        }
        Self::new(tools, parameters, Vec::new())
    }

    pub fn tools(&self) -> &[ToolName] {
        &self.tools
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Well identifiers from the `well_ids` parameter, in order.
    pub fn well_ids(&self) -> Vec<String> {
        self.parameters
            .get(WELL_IDS_PARAM)
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
