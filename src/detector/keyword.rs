//! Keyword and pattern based intent detection.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::IntentDetector;
use super::vocabulary::{Action, DEFAULT_TOOL, actions_in};
use crate::domain::{Intent, ToolName, WELL_IDS_PARAM};

/// Parameter key holding log-curve mnemonics named in the query.
pub const CURVES_PARAM: &str = "curves";

static SEQUENCING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(and then|then|after|afterwards|followed by|next)\b")
        .expect("SEQUENCING_RE is a compile-time constant")
});

static BATCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor (each|every)\b|\b(all|every|each|both)\s+(the\s+)?(wells?|curves?|logs?|formations?)\b")
        .expect("BATCH_RE is a compile-time constant")
});

/// NPD-style well names: `15/9-13`, `16/1-2`, `15/9-F-11`, `15/9-19A`.
static WELL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}/\d{1,2}-(?:[A-Z]{1,2}-)?\d{1,3}[A-Z]?\b").expect("WELL_ID_RE is a compile-time constant")
});

static CURVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(GR|RHOB|NPHI|DT|DTS|RT|RDEP|RMED|CALI|PEF|SP)\b").expect("CURVE_RE is a compile-time constant")
});

/// Which signal families fired for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionSignals {
    pub sequencing: bool,
    pub batch_quantifier: bool,
    pub multiple_entities: bool,
    pub action_list: bool,
}

impl DetectionSignals {
    pub fn any(&self) -> bool {
        self.sequencing || self.batch_quantifier || self.multiple_entities || self.action_list
    }
}

/// Deterministic detector over conjunctions, quantifiers, well ids and verbs.
#[derive(Debug, Clone, Default)]
pub struct KeywordDetector;

impl KeywordDetector {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate each signal family independently.
    pub fn signals(&self, query: &str) -> DetectionSignals {
        DetectionSignals {
            sequencing: SEQUENCING_RE.is_match(query),
            batch_quantifier: BATCH_RE.is_match(query),
            multiple_entities: well_ids_in(query).len() >= 2,
            action_list: has_action_list(query),
        }
    }
}

impl IntentDetector for KeywordDetector {
    fn is_multi_tool(&self, query: &str) -> bool {
        let signals = self.signals(query);
        tracing::debug!(?signals, "Multi-tool detection");
        signals.any()
    }

    fn extract_intent(&self, query: &str) -> Intent {
        let actions = actions_in(query);

        let mut tools: Vec<ToolName> = actions.iter().map(Action::tool).collect();
        tools.sort_by_key(ToolName::pipeline_rank);
        tools.dedup();
        if tools.is_empty() {
            tools.push(DEFAULT_TOOL);
        }

        let mut parameters = BTreeMap::new();
        let well_ids = well_ids_in(query);
        if !well_ids.is_empty() {
            parameters.insert(
                WELL_IDS_PARAM.to_string(),
                Value::Array(well_ids.into_iter().map(Value::String).collect()),
            );
        }
        let curves = curves_in(query);
        if !curves.is_empty() {
            parameters.insert(
                CURVES_PARAM.to_string(),
                Value::Array(curves.into_iter().map(Value::String).collect()),
            );
        }

        let actions = actions.iter().map(|a| a.as_str().to_string()).collect();
        Intent::new(tools, parameters, actions)
    }
}

/// Distinct well ids in order of first appearance.
fn well_ids_in(query: &str) -> Vec<String> {
    distinct_matches(&WELL_ID_RE, query)
}

fn curves_in(query: &str) -> Vec<String> {
    distinct_matches(&CURVE_RE, query)
}

fn distinct_matches(re: &Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        if !found.iter().any(|f| f == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}

/// A comma-separated list naming at least two distinct actions.
fn has_action_list(query: &str) -> bool {
    if !query.contains(',') {
        return false;
    }

    let mut segments_with_verbs = 0;
    let mut distinct: Vec<Action> = Vec::new();
    for segment in query.split(',') {
        let actions = actions_in(segment);
        if actions.is_empty() {
            continue;
        }
        segments_with_verbs += 1;
        for action in actions {
            if !distinct.contains(&action) {
                distinct.push(action);
            }
        }
    }

    segments_with_verbs >= 2 && distinct.len() >= 2
}
