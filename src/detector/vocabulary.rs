//! Action verbs and the tools they map to.

use std::fmt;

use crate::domain::ToolName;

/// Tool used when a query names no recognized action.
pub const DEFAULT_TOOL: ToolName = ToolName::QueryWellData;

/// Canonical action verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Validate,
    Compare,
    Compute,
    Export,
    Summarize,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Compare => "compare",
            Self::Compute => "compute",
            Self::Export => "export",
            Self::Summarize => "summarize",
        }
    }

    pub fn tool(&self) -> ToolName {
        match self {
            Self::Validate => ToolName::ValidateWellData,
            Self::Compare => ToolName::CompareWells,
            Self::Compute => ToolName::ComputeStatistics,
            Self::Export => ToolName::ExportResults,
            Self::Summarize => ToolName::SummarizeResults,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct VerbPattern {
    stem: &'static str,
    exact: bool,
    action: Action,
}

const fn prefix(stem: &'static str, action: Action) -> VerbPattern {
    VerbPattern {
        stem,
        exact: false,
        action,
    }
}

const fn exact(stem: &'static str, action: Action) -> VerbPattern {
    VerbPattern {
        stem,
        exact: true,
        action,
    }
}

const VERBS: &[VerbPattern] = &[
    prefix("validat", Action::Validate),
    prefix("verif", Action::Validate),
    prefix("check", Action::Validate),
    exact("qc", Action::Validate),
    prefix("compar", Action::Compare),
    prefix("contrast", Action::Compare),
    prefix("comput", Action::Compute),
    prefix("calculat", Action::Compute),
    prefix("statistic", Action::Compute),
    exact("stats", Action::Compute),
    prefix("analy", Action::Compute),
    prefix("export", Action::Export),
    prefix("download", Action::Export),
    exact("save", Action::Export),
    prefix("summar", Action::Summarize),
    prefix("report", Action::Summarize),
];

/// Action named by a single lowercase word, if any.
pub(crate) fn action_for_word(word: &str) -> Option<Action> {
    VERBS
        .iter()
        .find(|v| if v.exact { word == v.stem } else { word.starts_with(v.stem) })
        .map(|v| v.action)
}

/// Actions in order of first appearance, without repeats.
pub(crate) fn actions_in(text: &str) -> Vec<Action> {
    let lowered = text.to_lowercase();
    let mut found = Vec::new();
    for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        if let Some(action) = action_for_word(word)
            && !found.contains(&action)
        {
            found.push(action);
        }
    }
    found
}
