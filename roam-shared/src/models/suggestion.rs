use serde::{Deserialize, Serialize};

/// A server-provided candidate match for partial user text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "CityName")]
    pub name: String,
}

impl Suggestion {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Text copied into the query when this suggestion is picked.
    pub fn display_name(&self) -> &str {
        &self.name
    }
}
