//! Text rendering of step results: the generator prompt and the fallback
//! template share the same per-step line format.

use std::fmt::Write;

use serde_json::Value;

use crate::domain::{ExecutionPlan, ExecutionSummary, StepResult, StepResults};

/// Text shown when there is nothing to report.
pub const NO_RESULTS: &str = "no results available";

const TRUNCATION_MARKER: &str = "...[truncated]";

/// Compact payload text, cut to at most `max_chars` characters plus a marker.
pub fn payload_text(payload: &Value, max_chars: usize) -> String {
    let text = match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate(&text, max_chars)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// One line per result: `[step N] tool: ok <payload>` or `failed (kind) message`.
pub fn result_line(result: &StepResult, max_chars: usize) -> String {
    match result {
        StepResult::Success {
            step_id,
            tool_name,
            payload,
            ..
        } => format!("[step {}] {}: ok {}", step_id, tool_name, payload_text(payload, max_chars)),
        StepResult::Failure(f) => format!(
            "[step {}] {}: failed ({}) {}",
            f.step_id,
            f.tool_name,
            f.kind,
            truncate(&f.message, max_chars)
        ),
    }
}

/// Prompt handed to the generator.
pub fn build_prompt(query: &str, results: &StepResults, max_chars: usize) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Query: {}", query);
    let _ = writeln!(
        prompt,
        "Write one answer to the query from these tool results. Mention failed steps plainly."
    );
    if results.is_empty() {
        let _ = writeln!(prompt, "{}", NO_RESULTS);
    }
    for result in results.values() {
        let _ = writeln!(prompt, "{}", result_line(result, max_chars));
    }
    prompt
}

/// Deterministic response used whenever generation is unavailable.
///
/// Lists every recorded result, then any plan step without one, then a
/// summary line. Never empty.
pub fn render_fallback(query: &str, plan: &ExecutionPlan, results: &StepResults, max_chars: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Results for \"{}\":", query.trim());

    if results.is_empty() && plan.is_empty() {
        let _ = write!(out, "{}", NO_RESULTS);
        return out;
    }

    for result in results.values() {
        let _ = writeln!(out, "- {}", result_line(result, max_chars));
    }
    for step in plan.steps().iter().filter(|s| !results.contains_key(&s.step_id)) {
        let _ = writeln!(out, "- [step {}] {}: no result recorded", step.step_id, step.tool_name);
    }
    if results.is_empty() {
        let _ = writeln!(out, "{}", NO_RESULTS);
    }

    let summary = ExecutionSummary::from_results(results);
    let _ = write!(
        out,
        "{} of {} steps succeeded ({} failed, {} timed out, {} unknown tools)",
        summary.succeeded, summary.total, summary.failed, summary.timed_out, summary.unknown_tools
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionStep, FailureKind};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn results() -> StepResults {
        let mut r = StepResults::new();
        r.insert(1, StepResult::success(1, "validate_well_data", json!({"valid": true}), 4));
        r.insert(2, StepResult::failure(FailureKind::Exception, 2, "compare_wells", "Failed: boom"));
        r
    }

    #[test]
    fn test_result_lines() {
        let r = results();
        assert_eq!(result_line(&r[&1], 100), "[step 1] validate_well_data: ok {\"valid\":true}");
        assert_eq!(result_line(&r[&2], 100), "[step 2] compare_wells: failed (exception) Failed: boom");
    }

    #[test]
    fn test_string_payload_is_unquoted() {
        assert_eq!(payload_text(&json!("plain"), 10), "plain");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(payload_text(&json!("æøåæøå"), 3), format!("æøå{}", TRUNCATION_MARKER));
        assert_eq!(payload_text(&json!("short"), 5), "short");
    }

    #[test]
    fn test_prompt_mentions_query_and_every_step() {
        let prompt = build_prompt("compare 15/9-13", &results(), 100);
        assert!(prompt.starts_with("Query: compare 15/9-13"));
        assert!(prompt.contains("[step 1]"));
        assert!(prompt.contains("[step 2]"));
    }

    #[test]
    fn test_fallback_lists_everything() {
        let steps = vec![
            ExecutionStep::new(1, "validate_well_data", BTreeMap::new(), 10),
            ExecutionStep::new(2, "compare_wells", BTreeMap::new(), 10),
            ExecutionStep::new(3, "export_results", BTreeMap::new(), 10),
        ];
        let plan = ExecutionPlan::new("q", steps);
        let text = render_fallback("q", &plan, &results(), 100);
        assert!(text.contains("validate_well_data: ok"));
        assert!(text.contains("Failed: boom"));
        assert!(text.contains("[step 3] export_results: no result recorded"));
        assert!(text.ends_with("1 of 2 steps succeeded (1 failed, 0 timed out, 0 unknown tools)"));
    }

    #[test]
    fn test_fallback_empty() {
        let plan = ExecutionPlan::new("q", vec![]);
        let text = render_fallback("q", &plan, &StepResults::new(), 100);
        assert!(text.contains(NO_RESULTS));
    }
}
