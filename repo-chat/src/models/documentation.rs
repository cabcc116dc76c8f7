use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Documentation generated by the backend.
///
/// The `json` member is the structured payload the backend expects back on
/// every chat call. It is never modified here; only the summary and the file
/// listing are read for display and question suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    #[serde(default)]
    pub json: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub main_components: Vec<String>,
}

impl Documentation {
    pub fn new(json: Value) -> Self {
        Self {
            json,
            extra: Map::new(),
        }
    }

    /// False when the backend returned no structured payload at all.
    pub fn has_content(&self) -> bool {
        self.json.is_object()
    }

    /// Typed view of `json.summary`, if present and well-formed.
    pub fn summary(&self) -> Option<DocumentationSummary> {
        self.json
            .get("summary")
            .and_then(|s| serde_json::from_value(s.clone()).ok())
    }

    /// Documented file paths in the order the backend listed them.
    pub fn file_paths(&self) -> Vec<&str> {
        self.json
            .get("files")
            .and_then(Value::as_object)
            .map(|files| files.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn file_count(&self) -> usize {
        self.json
            .get("files")
            .and_then(Value::as_object)
            .map_or(0, Map::len)
    }
}
