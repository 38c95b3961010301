use roam_shared::Suggestion;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// When a type-ahead is allowed to start a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPolicy {
    /// Only after a suggestion has been picked and the query still matches it.
    #[default]
    #[serde(alias = "selected")]
    SelectedOnly,
    /// Any query that is non-empty after trimming.
    #[serde(alias = "free-text")]
    FreeText,
}

impl FromStr for SearchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "selected" | "selected_only" | "selected-only" => Ok(SearchPolicy::SelectedOnly),
            "free_text" | "free-text" | "freetext" => Ok(SearchPolicy::FreeText),
            other => Err(format!("unknown search policy: {}", other)),
        }
    }
}

/// The free-text query and the candidate picked for it, if any.
///
/// A selected candidate only survives while the query reproduces its name
/// verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    query: String,
    selected: Option<Suggestion>,
}

impl Selection {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> Option<&Suggestion> {
        self.selected.as_ref()
    }

    /// Replace the query text. Returns true if this edit dropped the selection.
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        self.query = text.into();
        match &self.selected {
            Some(candidate) if candidate.display_name() != self.query => {
                self.selected = None;
                true
            }
            _ => false,
        }
    }

    pub fn select(&mut self, candidate: Suggestion) {
        self.query = candidate.display_name().to_string();
        self.selected = Some(candidate);
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.selected = None;
    }

    pub fn can_search(&self, policy: SearchPolicy) -> bool {
        self.search_term(policy).is_some()
    }

    /// The text a search should use under `policy`, if searching is allowed.
    pub fn search_term(&self, policy: SearchPolicy) -> Option<&str> {
        match policy {
            SearchPolicy::SelectedOnly => self.selected.as_ref().map(|s| s.display_name()),
            SearchPolicy::FreeText => {
                let trimmed = self.query.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
        }
    }
}
