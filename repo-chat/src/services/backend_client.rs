//! HTTP client for the documentation/chat backend.
//!
//! The backend does all the real work (fetching the repository, generating
//! documentation, answering questions). This client only speaks its JSON
//! contract and folds every failure into [`ChatError`].

use crate::config::BackendSettings;
use crate::error::ChatError;
use crate::models::{ChatMessage, Documentation, Repository};
use async_trait::async_trait;
use chat_core::observability::{TracedClientExt, TracedRequest};
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

const HEALTH_PATH: &str = "/health";
const CONNECT_PATH: &str = "/connect-repository";
const GENERATE_PATH: &str = "/generate-documentation";
const CHAT_PATH: &str = "/chat-about-repository";

/// The remote operations a chat session depends on.
///
/// `request_id` is the correlation id of the inbound request, forwarded so
/// backend logs can be joined with ours.
#[async_trait]
pub trait RepositoryBackend: Send + Sync {
    /// Liveness probe. Never fails; any error counts as "down".
    async fn health_check(&self, request_id: Option<&str>) -> bool;

    async fn connect_repository(
        &self,
        repo_url: &str,
        request_id: Option<&str>,
    ) -> Result<Repository, ChatError>;

    async fn generate_documentation(
        &self,
        repository: &Repository,
        request_id: Option<&str>,
    ) -> Result<Documentation, ChatError>;

    /// Ask a question. `history` must already contain `message` as its last turn.
    async fn chat(
        &self,
        message: &str,
        repository: &Repository,
        documentation: &Documentation,
        history: &[ChatMessage],
        request_id: Option<&str>,
    ) -> Result<String, ChatError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectRequest<'a> {
    repo_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    owner: &'a str,
    repo: &'a str,
    branch: &'a str,
    file_structure: &'a Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    message: &'a str,
    repository: &'a Repository,
    documentation: &'a Value,
    conversation_history: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ConnectResponse {
    #[serde(default)]
    success: bool,
    repository: Option<Repository>,
    #[serde(flatten)]
    failure: FailureFields,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    success: bool,
    documentation: Option<Documentation>,
    #[serde(flatten)]
    failure: FailureFields,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

/// Error text the backend may put next to `success: false`.
#[derive(Deserialize, Default)]
struct FailureFields {
    error: Option<String>,
    message: Option<String>,
}

impl FailureFields {
    fn into_error(self, fallback: &str) -> ChatError {
        ChatError::RequestFailed {
            status: StatusCode::OK.as_u16(),
            message: self
                .error
                .or(self.message)
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

/// Build a `RequestFailed` from a non-200 response body.
///
/// Prefers a JSON `error`/`message` field, then the raw text, then the
/// status reason.
pub(crate) fn request_failed(status: StatusCode, body: &str) -> ChatError {
    let from_json = serde_json::from_str::<FailureFields>(body)
        .ok()
        .and_then(|f| f.error.or(f.message));

    let message = from_json.unwrap_or_else(|| {
        let text = body.trim();
        if text.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            text.to_string()
        }
    });

    ChatError::RequestFailed {
        status: status.as_u16(),
        message,
    }
}

/// `reqwest`-backed [`RepositoryBackend`].
pub struct HttpBackend {
    client: Client,
    settings: BackendSettings,
}

impl HttpBackend {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn base_url(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Send a request and decode a 200 JSON body, recording metrics either way.
    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: TracedRequest,
    ) -> Result<T, ChatError> {
        let start = Instant::now();
        let result = execute::<T>(request).await;

        record_call(operation, start, result.as_ref().err());

        if let Err(e) = &result {
            tracing::warn!(operation, error = %e, kind = e.kind(), "Backend call failed");
        }

        result
    }
}

async fn execute<T: DeserializeOwned>(request: TracedRequest) -> Result<T, ChatError> {
    let response = request.send().await?;
    let status = response.status();

    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(request_failed(status, &body));
    }

    Ok(response.json::<T>().await?)
}

fn record_call(operation: &'static str, start: Instant, error: Option<&ChatError>) {
    let outcome = error.map_or("success", ChatError::kind);

    counter!("backend_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    histogram!("backend_request_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

#[async_trait]
impl RepositoryBackend for HttpBackend {
    async fn health_check(&self, request_id: Option<&str>) -> bool {
        let start = Instant::now();
        let result = self
            .client
            .traced_get(&self.url(HEALTH_PATH))
            .timeout(self.settings.health_timeout())
            .request_id(request_id)
            .send()
            .await;

        let healthy = match result {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Backend health check returned non-OK status");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backend health check failed");
                false
            }
        };

        counter!(
            "backend_requests_total",
            "operation" => "health",
            "outcome" => if healthy { "success" } else { "backend_unavailable" }
        )
        .increment(1);
        histogram!("backend_request_duration_seconds", "operation" => "health")
            .record(start.elapsed().as_secs_f64());

        healthy
    }

    async fn connect_repository(
        &self,
        repo_url: &str,
        request_id: Option<&str>,
    ) -> Result<Repository, ChatError> {
        tracing::debug!(repo_url, "Connecting to repository");

        let request = self
            .client
            .traced_post(&self.url(CONNECT_PATH))
            .json(&ConnectRequest { repo_url })
            .timeout(self.settings.connect_timeout())
            .request_id(request_id);

        let response: ConnectResponse = self.send_json("connect", request).await?;

        match response.repository {
            Some(repository) if response.success => Ok(repository),
            _ => Err(response
                .failure
                .into_error("Backend did not return a repository")),
        }
    }

    async fn generate_documentation(
        &self,
        repository: &Repository,
        request_id: Option<&str>,
    ) -> Result<Documentation, ChatError> {
        tracing::debug!(repository = %repository.full_name(), "Requesting documentation");

        let request = self
            .client
            .traced_post(&self.url(GENERATE_PATH))
            .json(&GenerateRequest {
                owner: &repository.owner,
                repo: &repository.name,
                branch: &repository.default_branch,
                file_structure: &repository.file_structure,
            })
            .timeout(self.settings.documentation_timeout())
            .request_id(request_id);

        let response: GenerateResponse = self.send_json("generate_documentation", request).await?;

        match response.documentation {
            Some(documentation) if response.success => Ok(documentation),
            _ => Err(response
                .failure
                .into_error("Backend did not return documentation")),
        }
    }

    async fn chat(
        &self,
        message: &str,
        repository: &Repository,
        documentation: &Documentation,
        history: &[ChatMessage],
        request_id: Option<&str>,
    ) -> Result<String, ChatError> {
        tracing::debug!(
            repository = %repository.full_name(),
            history_len = history.len(),
            "Sending chat message"
        );

        let request = self
            .client
            .traced_post(&self.url(CHAT_PATH))
            .json(&ChatRequest {
                message,
                repository,
                documentation: &documentation.json,
                conversation_history: history,
            })
            .timeout(self.settings.chat_timeout())
            .request_id(request_id);

        let response: ChatResponse = self.send_json("chat", request).await?;
        Ok(response.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_prefers_json_error_field() {
        let err = request_failed(StatusCode::BAD_REQUEST, r#"{"error":"Invalid GitHub URL"}"#);
        match err {
            ChatError::RequestFailed { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid GitHub URL");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn request_failed_falls_back_to_text_then_reason() {
        match request_failed(StatusCode::INTERNAL_SERVER_ERROR, "  boom \n") {
            ChatError::RequestFailed { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {other:?}"),
        }

        match request_failed(StatusCode::SERVICE_UNAVAILABLE, "") {
            ChatError::RequestFailed { message, .. } => {
                assert_eq!(message, "Service Unavailable")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn base_url_ignores_trailing_slash() {
        let backend = HttpBackend::new(BackendSettings::with_base_url("http://localhost:4000/api/"));
        assert_eq!(backend.url(CHAT_PATH), "http://localhost:4000/api/chat-about-repository");
    }
}
