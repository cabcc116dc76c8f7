//! Session controller: the connect → document → chat flow for one user.

use crate::error::ChatError;
use crate::models::{
    ChatMessage, Documentation, DocumentationOverview, Repository, RepositoryInfo, Session,
    SessionView,
};
use crate::services::backend_client::RepositoryBackend;
use crate::services::suggestions::suggest_questions;
use std::sync::Arc;

/// Drives one [`Session`] against the backend.
///
/// Every remote command first checks backend health and fails closed with
/// [`ChatError::BackendUnavailable`]. A failed command leaves the session as
/// it found it, except that a failed chat keeps the user's question.
pub struct SessionController {
    backend: Arc<dyn RepositoryBackend>,
    session: Session,
    request_id: Option<String>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn RepositoryBackend>, session: Session) -> Self {
        Self {
            backend,
            session,
            request_id: None,
        }
    }

    /// Correlation id forwarded on every backend call.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub async fn check_health(&self) -> bool {
        self.backend.health_check(self.request_id.as_deref()).await
    }

    async fn ensure_backend(&self) -> Result<(), ChatError> {
        if self.check_health().await {
            Ok(())
        } else {
            Err(ChatError::BackendUnavailable)
        }
    }

    /// Connect to a repository by URL, replacing any current one.
    ///
    /// Re-entrant from every state; on success the session is back in
    /// `RepositoryConnected` with no documentation.
    pub async fn connect_repository(&mut self, repo_url: &str) -> Result<Repository, ChatError> {
        let repo_url = repo_url.trim();
        if repo_url.is_empty() {
            return Err(ChatError::LocalValidation(
                "Please enter a repository URL".to_string(),
            ));
        }

        self.ensure_backend().await?;

        let repository = self
            .backend
            .connect_repository(repo_url, self.request_id.as_deref())
            .await?;

        tracing::info!(repository = %repository.full_name(), "Repository connected");
        self.session.set_repository(repository.clone());
        Ok(repository)
    }

    /// Generate documentation for the connected repository.
    pub async fn generate_documentation(&mut self) -> Result<Documentation, ChatError> {
        let Some(repository) = self.session.repository() else {
            return Err(ChatError::NotReady("Connect to a repository first"));
        };

        self.ensure_backend().await?;

        let documentation = self
            .backend
            .generate_documentation(repository, self.request_id.as_deref())
            .await?;

        tracing::info!(
            repository = %repository.full_name(),
            files = documentation.file_count(),
            "Documentation generated"
        );
        self.session.set_documentation(documentation.clone());
        Ok(documentation)
    }

    /// Ask a question about the repository and return the backend's reply.
    ///
    /// The question goes out as the last turn of the history and is recorded
    /// whatever the outcome; the reply only if the call succeeds.
    pub async fn send_message(&mut self, message: &str) -> Result<String, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::LocalValidation(
                "Please enter a question".to_string(),
            ));
        }

        let (Some(repository), Some(documentation)) =
            (self.session.repository(), self.session.documentation())
        else {
            return Err(ChatError::NotReady(
                "Generate documentation first to start chatting",
            ));
        };

        self.ensure_backend().await?;

        let question = ChatMessage::user(message);
        let mut history = self.session.conversation_history().to_vec();
        history.push(question.clone());

        let result = self
            .backend
            .chat(
                message,
                repository,
                documentation,
                &history,
                self.request_id.as_deref(),
            )
            .await;

        self.session.push_message(question);
        let reply = result?;
        self.session.push_message(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    pub fn suggest_questions(&self) -> Vec<String> {
        suggest_questions(self.session.documentation())
    }

    /// Empty the chat logs; repository and documentation stay.
    pub fn clear_chat(&mut self) {
        self.session.clear_chat();
    }

    pub fn view(&self) -> SessionView {
        session_view(&self.session)
    }
}

/// Read model of a session, as shown to the user.
pub fn session_view(session: &Session) -> SessionView {
    SessionView {
        state: session.state(),
        repository: session.repository().map(RepositoryInfo::from),
        documentation: session.documentation().map(DocumentationOverview::from),
        messages: session.messages().to_vec(),
        suggestions: suggest_questions(session.documentation()),
    }
}
