//! JSON API over one browser session's chat state.
//!
//! The cookie-scoped `tower_sessions::Session` only stores a per-browser key.
//! Each command checks the matching [`Session`] out of the registry, runs one
//! controller operation and commits it back, also when the operation failed.

use crate::error::ChatError;
use crate::models::{Session, SessionView};
use crate::services::{session_view, suggest_questions, SessionController, SessionLease};
use crate::AppState;
use axum::{extract::State, Json};
use chat_core::middleware::RequestId;
use serde::{Deserialize, Serialize};
use tower_sessions::Session as WebSession;
use uuid::Uuid;

const SESSION_KEY: &str = "repo_chat.key";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRepositoryRequest {
    #[serde(default)]
    pub repo_url: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub session: SessionView,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub available: bool,
}

#[derive(Serialize)]
pub struct Suggestions {
    pub suggestions: Vec<String>,
}

/// Key of an existing chat session, if this browser has one.
async fn existing_key(web: &WebSession) -> Result<Option<Uuid>, ChatError> {
    Ok(web.get::<Uuid>(SESSION_KEY).await?)
}

/// Stable per-browser key, created on first use.
async fn session_key(web: &WebSession) -> Result<Uuid, ChatError> {
    if let Some(key) = existing_key(web).await? {
        return Ok(key);
    }

    let key = Uuid::new_v4();
    web.insert(SESSION_KEY, key).await?;
    Ok(key)
}

async fn load_session(state: &AppState, web: &WebSession) -> Result<Session, ChatError> {
    Ok(existing_key(web)
        .await?
        .map(|key| state.sessions.get(&key))
        .unwrap_or_default())
}

/// A controller holding the only lease on one browser's session for the
/// duration of a command.
struct ScopedController {
    lease: SessionLease,
    controller: SessionController,
}

impl ScopedController {
    async fn open(
        state: &AppState,
        web: &WebSession,
        request_id: RequestId,
    ) -> Result<Self, ChatError> {
        let key = session_key(web).await?;
        let mut lease = state.sessions.checkout(key)?;

        let controller = SessionController::new(state.backend.clone(), lease.take_session())
            .with_request_id(request_id.0);

        Ok(Self { lease, controller })
    }

    /// Store the session, release the lease and return the view.
    fn commit(self) -> SessionView {
        let Self { lease, controller } = self;
        let view = controller.view();
        lease.commit(controller.into_session());
        view
    }
}

pub async fn backend_health(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Json<BackendStatus> {
    let available = state.backend.health_check(Some(request_id.as_str())).await;
    Json(BackendStatus { available })
}

pub async fn get_session(
    State(state): State<AppState>,
    web: WebSession,
) -> Result<Json<SessionView>, ChatError> {
    let session = load_session(&state, &web).await?;
    Ok(Json(session_view(&session)))
}

pub async fn connect_repository(
    State(state): State<AppState>,
    web: WebSession,
    request_id: RequestId,
    Json(payload): Json<ConnectRepositoryRequest>,
) -> Result<Json<SessionView>, ChatError> {
    let mut scope = ScopedController::open(&state, &web, request_id).await?;
    let result = scope.controller.connect_repository(&payload.repo_url).await;
    let view = scope.commit();

    result?;
    Ok(Json(view))
}

pub async fn generate_documentation(
    State(state): State<AppState>,
    web: WebSession,
    request_id: RequestId,
) -> Result<Json<SessionView>, ChatError> {
    let mut scope = ScopedController::open(&state, &web, request_id).await?;
    let result = scope.controller.generate_documentation().await;
    let view = scope.commit();

    result?;
    Ok(Json(view))
}

pub async fn send_message(
    State(state): State<AppState>,
    web: WebSession,
    request_id: RequestId,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ChatError> {
    let mut scope = ScopedController::open(&state, &web, request_id).await?;
    let result = scope.controller.send_message(&payload.message).await;
    // Stored even on failure so the unanswered question stays in the log.
    let session = scope.commit();

    let reply = result?;
    Ok(Json(ChatReply { reply, session }))
}

pub async fn clear_chat(
    State(state): State<AppState>,
    web: WebSession,
    request_id: RequestId,
) -> Result<Json<SessionView>, ChatError> {
    let mut scope = ScopedController::open(&state, &web, request_id).await?;
    scope.controller.clear_chat();
    Ok(Json(scope.commit()))
}

pub async fn suggestions(
    State(state): State<AppState>,
    web: WebSession,
) -> Result<Json<Suggestions>, ChatError> {
    let session = load_session(&state, &web).await?;
    Ok(Json(Suggestions {
        suggestions: suggest_questions(session.documentation()),
    }))
}
