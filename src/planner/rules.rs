//! Dependency inference rules.
//!
//! Each tool maps to exactly one [`DependencyRule`]. Rules only ever look at
//! steps created before the step being resolved, so the inferred graph is
//! acyclic by construction.

use std::collections::BTreeSet;

use crate::domain::{ExecutionStep, ToolName, WELL_ID_PARAM, WELL_IDS_PARAM};

/// How a step's dependencies are derived from the steps before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyRule {
    /// No dependencies
    Independent,
    /// Every earlier step produced by any of these tools
    DependsOnAllOfTool(Vec<ToolName>),
    /// Every earlier step
    DependsOnAllPriorSteps,
    /// Earlier steps of `tool` that target one of this step's entities
    DependsOnMatchingEntity {
        tool: ToolName,
        param_keys: &'static [&'static str],
    },
}

impl DependencyRule {
    /// Rule table for the tool vocabulary.
    pub fn for_tool(tool: ToolName) -> Self {
        match tool {
            ToolName::QueryWellData | ToolName::ValidateWellData => Self::Independent,
            ToolName::ComputeStatistics => Self::DependsOnMatchingEntity {
                tool: ToolName::ValidateWellData,
                param_keys: &[WELL_ID_PARAM, WELL_IDS_PARAM],
            },
            ToolName::CompareWells => {
                Self::DependsOnAllOfTool(vec![ToolName::ValidateWellData, ToolName::ComputeStatistics])
            }
            ToolName::ExportResults | ToolName::SummarizeResults => Self::DependsOnAllPriorSteps,
        }
    }

    /// Rule for a step's tool name; unknown tools are independent.
    pub fn for_step(step: &ExecutionStep) -> Self {
        step.tool_name
            .parse::<ToolName>()
            .map(Self::for_tool)
            .unwrap_or(Self::Independent)
    }

    /// Step ids `step` depends on, drawn from `all_steps`.
    pub fn dependencies(&self, step: &ExecutionStep, all_steps: &[ExecutionStep]) -> BTreeSet<u32> {
        let earlier = all_steps.iter().filter(|other| other.step_id < step.step_id);

        match self {
            Self::Independent => BTreeSet::new(),
            Self::DependsOnAllOfTool(tools) => earlier
                .filter(|other| tools.iter().any(|t| t.as_str() == other.tool_name))
                .map(|other| other.step_id)
                .collect(),
            Self::DependsOnAllPriorSteps => earlier.map(|other| other.step_id).collect(),
            Self::DependsOnMatchingEntity { tool, param_keys } => {
                let wanted = entities(step, param_keys);
                if wanted.is_empty() {
                    return BTreeSet::new();
                }
                earlier
                    .filter(|other| other.tool_name == tool.as_str())
                    .filter(|other| !entities(other, param_keys).is_disjoint(&wanted))
                    .map(|other| other.step_id)
                    .collect()
            }
        }
    }
}

fn entities(step: &ExecutionStep, param_keys: &[&str]) -> BTreeSet<String> {
    param_keys.iter().flat_map(|key| step.entity_ids(key)).collect()
}

/// Fill in `depends_on` for every step.
pub fn infer_dependencies(steps: &mut [ExecutionStep]) {
    let all: &[ExecutionStep] = steps;
    let resolved: Vec<BTreeSet<u32>> = all
        .iter()
        .map(|step| DependencyRule::for_step(step).dependencies(step, all))
        .collect();

    for (step, depends_on) in steps.iter_mut().zip(resolved) {
        step.depends_on = depends_on;
    }
}
