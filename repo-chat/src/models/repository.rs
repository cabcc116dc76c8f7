use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GitHub repository as described by the backend after connecting to it.
///
/// Sent back verbatim on every chat call, so fields the frontend does not
/// know about are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque file tree, only ever forwarded to documentation generation.
    #[serde(default)]
    pub file_structure: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Repository {
    /// `owner/name`, as shown in logs.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
