use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SuggestionId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionId::Number(n) => write!(f, "{n}"),
            SuggestionId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Source-agnostic autocomplete entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub id: Option<SuggestionId>,
    pub label: String,
}

impl Suggestion {
    pub fn new(id: Option<SuggestionId>, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}
