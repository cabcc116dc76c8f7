//! Per-user chat session state.

use super::{ChatMessage, Documentation, DocumentationSummary, Repository};
use serde::{Deserialize, Serialize};

/// Everything one interactive user has built up so far.
///
/// Only the session controller mutates it, which keeps the ordering
/// invariant (repository before documentation before chat) and the paired
/// message/history logs in one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    repository: Option<Repository>,
    documentation: Option<Documentation>,
    /// Log shown to the user.
    messages: Vec<ChatMessage>,
    /// Turns resent to the backend on every chat call.
    conversation_history: Vec<ChatMessage>,
}

/// Where a session is in the connect → document → chat flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NoRepository,
    RepositoryConnected,
    DocumentationReady,
    Chatting,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    pub fn documentation(&self) -> Option<&Documentation> {
        self.documentation.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn conversation_history(&self) -> &[ChatMessage] {
        &self.conversation_history
    }

    /// Derived; `Chatting` is `DocumentationReady` with a non-empty log.
    pub fn state(&self) -> SessionState {
        match (&self.repository, &self.documentation) {
            (None, _) => SessionState::NoRepository,
            (Some(_), None) => SessionState::RepositoryConnected,
            (Some(_), Some(_)) if self.messages.is_empty() => SessionState::DocumentationReady,
            (Some(_), Some(_)) => SessionState::Chatting,
        }
    }

    pub fn can_chat(&self) -> bool {
        self.repository.is_some() && self.documentation.is_some()
    }

    /// Replace the repository. Documentation and chat logs belong to the old
    /// repository and are dropped.
    pub(crate) fn set_repository(&mut self, repository: Repository) {
        self.repository = Some(repository);
        self.documentation = None;
        self.clear_chat();
    }

    pub(crate) fn set_documentation(&mut self, documentation: Documentation) {
        self.documentation = Some(documentation);
    }

    /// Append to both the visible log and the backend history.
    pub(crate) fn push_message(&mut self, message: ChatMessage) {
        self.conversation_history.push(message.clone());
        self.messages.push(message);
    }

    pub(crate) fn clear_chat(&mut self) {
        self.messages.clear();
        self.conversation_history.clear();
    }
}

/// Repository details without the (potentially large) file tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Repository> for RepositoryInfo {
    fn from(repository: &Repository) -> Self {
        Self {
            owner: repository.owner.clone(),
            name: repository.name.clone(),
            default_branch: repository.default_branch.clone(),
            url: repository.url.clone(),
            description: repository.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DocumentationSummary>,
    pub documented_files: usize,
}

impl From<&Documentation> for DocumentationOverview {
    fn from(documentation: &Documentation) -> Self {
        Self {
            summary: documentation.summary(),
            documented_files: documentation.file_count(),
        }
    }
}

/// Read model handed to whatever UI drives the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub state: SessionState,
    pub repository: Option<RepositoryInfo>,
    pub documentation: Option<DocumentationOverview>,
    pub messages: Vec<ChatMessage>,
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repository(name: &str) -> Repository {
        serde_json::from_value(json!({
            "owner": "octo",
            "name": name,
            "defaultBranch": "main",
            "url": format!("https://github.com/octo/{name}"),
        }))
        .unwrap()
    }

    #[test]
    fn state_follows_populated_fields() {
        let mut session = Session::new();
        assert_eq!(session.state(), SessionState::NoRepository);
        assert!(!session.can_chat());

        session.set_repository(repository("demo"));
        assert_eq!(session.state(), SessionState::RepositoryConnected);
        assert!(!session.can_chat());

        session.set_documentation(Documentation::new(json!({"files": {}})));
        assert_eq!(session.state(), SessionState::DocumentationReady);
        assert!(session.can_chat());

        session.push_message(ChatMessage::user("hello"));
        assert_eq!(session.state(), SessionState::Chatting);
    }

    #[test]
    fn reconnect_drops_documentation_and_chat() {
        let mut session = Session::new();
        session.set_repository(repository("a"));
        session.set_documentation(Documentation::new(json!({})));
        session.push_message(ChatMessage::user("q"));

        session.set_repository(repository("b"));

        assert_eq!(session.repository().unwrap().name, "b");
        assert!(session.documentation().is_none());
        assert!(session.messages().is_empty());
        assert!(session.conversation_history().is_empty());
        assert_eq!(session.state(), SessionState::RepositoryConnected);
    }

    #[test]
    fn session_survives_serialization() {
        let mut session = Session::new();
        session.set_repository(repository("demo"));
        session.push_message(ChatMessage::user("q"));

        let stored = serde_json::to_value(&session).unwrap();
        let restored: Session = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, session);
    }
}
