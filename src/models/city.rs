use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Trip-type reference record. The backend labels it with either `name` or `label`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripTypeRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl TripTypeRecord {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.label.as_deref())
    }
}
