//! Execution Planner - turns an intent into a dependency-aware plan
//!
//! Planning runs four pure stages in order:
//! 1. **Step generation**: per-entity tools fan out to one step per well
//! 2. **Dependency inference**: the [`DependencyRule`] table
//! 3. **Parallel groups**: layered topological sort
//! 4. **Latency estimate**: derived by [`ExecutionPlan::new`]
//!
//! The same `(query, intent)` always yields the same plan.

mod latency;
mod layering;
mod rules;

pub use latency::{LatencyTable, default_latency_ms};
pub use layering::assign_parallel_groups;
pub use rules::{DependencyRule, infer_dependencies};

use crate::config::PlannerConfig;
use crate::domain::{ExecutionPlan, ExecutionStep, Intent, WELL_ID_PARAM, WELL_IDS_PARAM};
use crate::error::Result;

/// Builds execution plans from intents
pub trait Planner: Send + Sync {
    fn plan(&self, query: &str, intent: &Intent) -> Result<ExecutionPlan>;
}

/// Rule-table planner for the well-data tool vocabulary.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlanner {
    latency: LatencyTable,
}

impl ExecutionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::with_latency(LatencyTable::from_config(config))
    }

    pub fn with_latency(latency: LatencyTable) -> Self {
        Self { latency }
    }

    /// Stage 1: one step per tool, or per well for per-entity tools.
    fn generate_steps(&self, intent: &Intent) -> Vec<ExecutionStep> {
        let well_ids = intent.well_ids();
        let mut steps = Vec::new();
        let mut next_id = 1u32;

        for tool in intent.tools() {
            let latency = self.latency.estimate(tool.as_str());

            if tool.is_per_entity() && well_ids.len() > 1 {
                for well_id in &well_ids {
                    let mut parameters = intent.parameters().clone();
                    parameters.remove(WELL_IDS_PARAM);
                    parameters.insert(WELL_ID_PARAM.to_string(), serde_json::Value::String(well_id.clone()));
                    steps.push(ExecutionStep::new(next_id, tool.as_str(), parameters, latency));
                    next_id += 1;
                }
            } else {
                steps.push(ExecutionStep::new(next_id, tool.as_str(), intent.parameters().clone(), latency));
                next_id += 1;
            }
        }

        steps
    }
}

impl Planner for ExecutionPlanner {
    fn plan(&self, query: &str, intent: &Intent) -> Result<ExecutionPlan> {
        let mut steps = self.generate_steps(intent);
        infer_dependencies(&mut steps);
        assign_parallel_groups(&mut steps)?;

        let plan = ExecutionPlan::new(query, steps);
        plan.validate()?;

        tracing::info!(
            steps = plan.steps().len(),
            groups = plan.groups().len(),
            estimated_ms = plan.total_estimated_latency_ms(),
            savings = plan.parallelization_savings(),
            "Execution plan built"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ToolName;
    use std::collections::BTreeSet;

    const WELLS: [&str; 2] = ["15/9-13", "16/1-2"];

    fn plan(tools: Vec<ToolName>, wells: &[&str]) -> ExecutionPlan {
        ExecutionPlanner::new()
            .plan("test query", &Intent::for_wells(tools, wells))
            .unwrap()
    }

    #[test]
    fn test_per_entity_tool_fans_out() {
        let plan = plan(vec![ToolName::ValidateWellData], &WELLS);
        assert_eq!(plan.steps().len(), 2);
        for step in plan.steps() {
            assert_eq!(step.tool_name, "validate_well_data");
            assert_eq!(step.parallel_group, 0);
            assert!(step.parameters.contains_key(WELL_ID_PARAM));
            assert!(!step.parameters.contains_key(WELL_IDS_PARAM));
        }
        assert_eq!(plan.steps()[0].parameters[WELL_ID_PARAM], "15/9-13");
        assert_eq!(plan.steps()[1].parameters[WELL_ID_PARAM], "16/1-2");
    }

    #[test]
    fn test_single_well_keeps_full_parameters() {
        let plan = plan(vec![ToolName::ValidateWellData], &["15/9-13"]);
        assert_eq!(plan.steps().len(), 1);
        assert_eq!(plan.steps()[0].parameters[WELL_IDS_PARAM], serde_json::json!(["15/9-13"]));
    }

    #[test]
    fn test_compare_depends_on_validations() {
        let plan = plan(vec![ToolName::ValidateWellData, ToolName::CompareWells], &WELLS);
        assert_eq!(plan.steps().len(), 3);
        let compare = plan.step(3).unwrap();
        assert_eq!(compare.tool_name, "compare_wells");
        assert_eq!(compare.depends_on, BTreeSet::from([1, 2]));
        assert!(compare.parallel_group > plan.step(1).unwrap().parallel_group);
        assert!(compare.parallel_group > plan.step(2).unwrap().parallel_group);
    }

    #[test]
    fn test_full_pipeline_layers() {
        let plan = plan(
            vec![
                ToolName::ValidateWellData,
                ToolName::ComputeStatistics,
                ToolName::CompareWells,
                ToolName::ExportResults,
            ],
            &WELLS,
        );
        let groups: Vec<(u32, u32)> = plan.steps().iter().map(|s| (s.step_id, s.parallel_group)).collect();
        assert_eq!(groups, vec![(1, 0), (2, 0), (3, 1), (4, 1), (5, 2), (6, 3)]);
        assert_eq!(plan.step(3).unwrap().depends_on, BTreeSet::from([1]));
        assert_eq!(plan.step(4).unwrap().depends_on, BTreeSet::from([2]));
        assert_eq!(plan.step(6).unwrap().depends_on, BTreeSet::from([1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_latency_estimate() {
        let plan = plan(vec![ToolName::ValidateWellData, ToolName::CompareWells], &WELLS);
        assert_eq!(plan.sequential_latency_ms(), 2000 + 2000 + 3000);
        assert_eq!(plan.total_estimated_latency_ms(), 2000 + 3000);
        let expected = (7000.0 - 5000.0) / 7000.0;
        assert!((plan.parallelization_savings() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_intent_yields_empty_plan() {
        let plan = ExecutionPlanner::new().plan("nothing", &Intent::empty()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.total_estimated_latency_ms(), 0);
        assert_eq!(plan.parallelization_savings(), 0.0);
    }

    #[test]
    fn test_planning_is_deterministic() {
        let intent = Intent::for_wells(
            vec![ToolName::ValidateWellData, ToolName::ComputeStatistics, ToolName::SummarizeResults],
            &["15/9-13", "16/1-2", "15/9-19A"],
        );
        let planner = ExecutionPlanner::new();
        let a = planner.plan("q", &intent).unwrap();
        let b = planner.plan("q", &intent).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_latency_overrides_from_config() {
        let mut config = PlannerConfig::default();
        config.latency_overrides.insert("validate_well_data".into(), 500);
        let plan = ExecutionPlanner::from_config(&config)
            .plan("q", &Intent::for_wells(vec![ToolName::ValidateWellData], &WELLS))
            .unwrap();
        assert!(plan.steps().iter().all(|s| s.estimated_latency_ms == 500));
    }
}
