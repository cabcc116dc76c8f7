//! Starter questions offered next to the chat input.

use crate::models::Documentation;

/// Offered before any documentation exists.
pub const BASIC_QUESTIONS: [&str; 3] = [
    "What does this repository do?",
    "How is the project structured?",
    "What are the main files?",
];

/// Always offered once documentation is ready.
pub const GENERAL_QUESTIONS: [&str; 4] = [
    "What does this repository do?",
    "How do I get started with this project?",
    "What are the main components?",
    "How is the code organized?",
];

/// Path fragments that usually mark an entry point.
const ENTRY_POINT_KEYWORDS: [&str; 4] = ["main", "index", "app", "server"];

pub const MAX_SUGGESTIONS: usize = 6;

/// Suggest questions for the current documentation.
///
/// With documentation, the general questions are followed by one about the
/// first entry-point-looking file and one about the second documented file
/// (file order is the backend's).
pub fn suggest_questions(documentation: Option<&Documentation>) -> Vec<String> {
    let Some(documentation) = documentation.filter(|d| d.has_content()) else {
        return BASIC_QUESTIONS.iter().map(|q| q.to_string()).collect();
    };

    let mut suggestions: Vec<String> = GENERAL_QUESTIONS.iter().map(|q| q.to_string()).collect();

    let files = documentation.file_paths();

    if let Some(entry_point) = files.iter().find(|path| is_entry_point(path)) {
        suggestions.push(format!("What does {} do?", entry_point));
    }
    if let Some(second) = files.get(1) {
        suggestions.push(format!("Explain the {} file", second));
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

fn is_entry_point(path: &str) -> bool {
    let path = path.to_lowercase();
    ENTRY_POINT_KEYWORDS
        .iter()
        .any(|keyword| path.contains(keyword))
}
