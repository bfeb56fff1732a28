use serde::{Deserialize, Serialize};

/// A user-defined grouping for tasks. The server names the label field
/// `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "category")]
    pub name: String,
}

/// Body for create and rename calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub category: String,
}

impl CategoryPayload {
    pub fn new(name: impl Into<String>) -> Self {
        Self { category: name.into() }
    }
}

impl Category {
    /// Route the navigation list links to, e.g. `/work` for "Work".
    pub fn route(&self) -> String {
        format!("/{}", self.name.to_lowercase())
    }
}
