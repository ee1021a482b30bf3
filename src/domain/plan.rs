//! Execution plan types.
//!
//! An [`ExecutionPlan`] is derived once from a list of steps; its latency
//! figures are pure functions of those steps and are never updated afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use crate::error::{OrchestrationError, Result};

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStep {
    pub step_id: u32,
    pub tool_name: String,
    pub parameters: BTreeMap<String, Value>,
    pub depends_on: BTreeSet<u32>,
    pub parallel_group: u32,
    pub estimated_latency_ms: u64,
}

impl ExecutionStep {
    /// Create an unscheduled step (no dependencies, group 0).
    pub fn new(
        step_id: u32,
        tool_name: impl Into<String>,
        parameters: BTreeMap<String, Value>,
        estimated_latency_ms: u64,
    ) -> Self {
        Self {
            step_id,
            tool_name: tool_name.into(),
            parameters,
            depends_on: BTreeSet::new(),
            parallel_group: 0,
            estimated_latency_ms,
        }
    }

    /// Entity identifiers this step targets under `key`.
    ///
    /// A string value names one entity; an array names several.
    pub fn entity_ids(&self, key: &str) -> BTreeSet<String> {
        match self.parameters.get(key) {
            Some(Value::String(id)) => BTreeSet::from([id.clone()]),
            Some(Value::Array(ids)) => ids.iter().filter_map(Value::as_str).map(String::from).collect(),
            _ => BTreeSet::new(),
        }
    }
}

/// A dependency-aware schedule for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    query: String,
    steps: Vec<ExecutionStep>,
    total_estimated_latency_ms: u64,
    parallelization_savings: f64,
}

impl ExecutionPlan {
    /// Build a plan, deriving its latency estimate from the steps.
    pub fn new(query: impl Into<String>, steps: Vec<ExecutionStep>) -> Self {
        let sequential = sequential_latency_ms(&steps);
        let parallel = parallel_latency_ms(&steps);
        let parallelization_savings = if sequential == 0 {
            0.0
        } else {
            (sequential - parallel) as f64 / sequential as f64
        };

        Self {
            query: query.into(),
            steps,
            total_estimated_latency_ms: parallel,
            parallelization_savings,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    /// Estimated wall-clock latency when groups run in parallel.
    pub fn total_estimated_latency_ms(&self) -> u64 {
        self.total_estimated_latency_ms
    }

    /// Fraction of the sequential latency saved by parallel groups, in [0, 1).
    pub fn parallelization_savings(&self) -> f64 {
        self.parallelization_savings
    }

    /// Estimated latency if every step ran one after another.
    pub fn sequential_latency_ms(&self) -> u64 {
        sequential_latency_ms(&self.steps)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_ids(&self) -> Vec<u32> {
        self.steps.iter().map(|s| s.step_id).collect()
    }

    pub fn step(&self, step_id: u32) -> Option<&ExecutionStep> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    /// Steps bucketed by parallel group, in ascending group order.
    pub fn groups(&self) -> Vec<(u32, Vec<&ExecutionStep>)> {
        let mut groups: BTreeMap<u32, Vec<&ExecutionStep>> = BTreeMap::new();
        for step in &self.steps {
            groups.entry(step.parallel_group).or_default().push(step);
        }
        groups.into_iter().collect()
    }

    /// Check the structural invariants every plan must satisfy.
    pub fn validate(&self) -> Result<()> {
        let mut groups: HashMap<u32, u32> = HashMap::new();
        let mut last_id = 0;

        for step in &self.steps {
            if step.step_id <= last_id {
                return Err(OrchestrationError::PlanInvariant(format!(
                    "step ids must be positive and strictly increasing, got {} after {}",
                    step.step_id, last_id
                )));
            }
            if step.estimated_latency_ms == 0 {
                return Err(OrchestrationError::PlanInvariant(format!(
                    "step {} has zero estimated latency",
                    step.step_id
                )));
            }
            for dep in &step.depends_on {
                let dep_group = groups.get(dep).ok_or_else(|| {
                    OrchestrationError::PlanInvariant(format!(
                        "step {} depends on step {} which does not precede it",
                        step.step_id, dep
                    ))
                })?;
                if *dep_group >= step.parallel_group {
                    return Err(OrchestrationError::PlanInvariant(format!(
                        "step {} in group {} depends on step {} in group {}",
                        step.step_id, step.parallel_group, dep, dep_group
                    )));
                }
            }
            groups.insert(step.step_id, step.parallel_group);
            last_id = step.step_id;
        }

        Ok(())
    }

    /// Human-readable listing of the plan.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Plan for: {}", self.query);
        if self.steps.is_empty() {
            out.push_str("  (no steps)\n");
            return out;
        }

        for (group, steps) in self.groups() {
            let _ = writeln!(out, "  group {}:", group);
            for step in steps {
                let deps = if step.depends_on.is_empty() {
                    String::new()
                } else {
                    let ids: Vec<String> = step.depends_on.iter().map(|d| d.to_string()).collect();
                    format!(" after [{}]", ids.join(", "))
                };
                let _ = writeln!(
                    out,
                    "    [{}] {} ~{}ms{}",
                    step.step_id, step.tool_name, step.estimated_latency_ms, deps
                );
            }
        }

        let _ = writeln!(
            out,
            "  estimated: {}ms parallel / {}ms sequential ({:.0}% saved)",
            self.total_estimated_latency_ms,
            self.sequential_latency_ms(),
            self.parallelization_savings * 100.0
        );
        out
    }
}

fn sequential_latency_ms(steps: &[ExecutionStep]) -> u64 {
    steps.iter().map(|s| s.estimated_latency_ms).sum()
}

fn parallel_latency_ms(steps: &[ExecutionStep]) -> u64 {
    let mut slowest: BTreeMap<u32, u64> = BTreeMap::new();
    for step in steps {
        let entry = slowest.entry(step.parallel_group).or_insert(0);
        *entry = (*entry).max(step.estimated_latency_ms);
    }
    slowest.values().sum()
}
