//! Parallel-group assignment by layered topological sort.

use std::collections::HashMap;

use crate::domain::ExecutionStep;
use crate::error::{OrchestrationError, Result};

/// Assign each step the smallest group strictly above all its dependencies.
///
/// Layers are peeled Kahn-style: every round takes the unassigned steps whose
/// dependencies are all assigned. A round that makes no progress means the
/// graph has a cycle or a dependency on a missing step.
pub fn assign_parallel_groups(steps: &mut [ExecutionStep]) -> Result<()> {
    let mut assigned: HashMap<u32, u32> = HashMap::with_capacity(steps.len());
    let mut layer = 0u32;

    while assigned.len() < steps.len() {
        let ready: Vec<usize> = steps
            .iter()
            .enumerate()
            .filter(|(_, step)| !assigned.contains_key(&step.step_id))
            .filter(|(_, step)| step.depends_on.iter().all(|dep| assigned.contains_key(dep)))
            .map(|(idx, _)| idx)
            .collect();

        if ready.is_empty() {
            let stuck: Vec<u32> = steps
                .iter()
                .map(|s| s.step_id)
                .filter(|id| !assigned.contains_key(id))
                .collect();
            return Err(OrchestrationError::CyclicDependencies(stuck));
        }

        for idx in ready {
            steps[idx].parallel_group = layer;
            assigned.insert(steps[idx].step_id, layer);
        }
        layer += 1;
    }

    Ok(())
}
