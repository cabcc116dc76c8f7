mod common;

use common::{
    backend_settings, demo_documentation, demo_repository, healthy_backend, mount_chat_reply,
    mount_health, received_bodies,
};
use repo_chat::error::ChatError;
use repo_chat::models::{ChatMessage, Documentation, Repository, Role, Session};
use repo_chat::services::{HttpBackend, RepositoryBackend, SessionController};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller(server: &MockServer) -> SessionController {
    let backend: Arc<dyn RepositoryBackend> = Arc::new(HttpBackend::new(backend_settings(server)));
    SessionController::new(backend, Session::new())
}

fn repository() -> Repository {
    serde_json::from_value(demo_repository()).unwrap()
}

#[tokio::test]
async fn health_check_reflects_status() {
    let server = MockServer::start().await;
    mount_health(&server, 200).await;
    let backend = HttpBackend::new(backend_settings(&server));
    assert!(backend.health_check(None).await);

    let down = MockServer::start().await;
    mount_health(&down, 503).await;
    let backend = HttpBackend::new(backend_settings(&down));
    assert!(!backend.health_check(None).await);
}

#[tokio::test]
async fn health_check_is_false_when_unreachable() {
    let backend = HttpBackend::new(repo_chat::config::BackendSettings {
        health_timeout_secs: 1,
        ..repo_chat::config::BackendSettings::with_base_url("http://127.0.0.1:1/api")
    });
    assert!(!backend.health_check(None).await);
}

#[tokio::test]
async fn connect_sends_repo_url_and_forwards_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/connect-repository"))
        .and(header("x-request-id", "req-42"))
        .and(body_json(json!({"repoUrl": "https://github.com/octo/demo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "repository": demo_repository()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(backend_settings(&server));
    let repo = backend
        .connect_repository("https://github.com/octo/demo", Some("req-42"))
        .await
        .unwrap();

    assert_eq!(repo.full_name(), "octo/demo");
    assert_eq!(repo.default_branch, "main");
}

#[tokio::test]
async fn generate_sends_owner_repo_branch_and_file_structure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-documentation"))
        .and(body_json(json!({
            "owner": "octo",
            "repo": "demo",
            "branch": "main",
            "fileStructure": demo_repository()["fileStructure"].clone()
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "documentation": demo_documentation()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(backend_settings(&server));
    let documentation = backend
        .generate_documentation(&repository(), None)
        .await
        .unwrap();

    assert!(documentation.has_content());
    assert_eq!(documentation.file_paths(), vec!["main.py", "utils.py"]);
}

#[tokio::test]
async fn non_200_uses_error_field_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/connect-repository"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Repository not found"
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(backend_settings(&server));
    let err = backend
        .connect_repository("https://github.com/octo/missing", None)
        .await
        .unwrap_err();

    match err {
        ChatError::RequestFailed { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Repository not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn success_false_is_a_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-documentation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Rate limited"
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(backend_settings(&server));
    let err = backend
        .generate_documentation(&repository(), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, ChatError::RequestFailed { ref message, .. } if message == "Rate limited")
    );
}

#[tokio::test]
async fn malformed_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat-about-repository"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(backend_settings(&server));
    let documentation = Documentation::new(demo_documentation()["json"].clone());
    let err = backend
        .chat(
            "hi",
            &repository(),
            &documentation,
            &[ChatMessage::user("hi")],
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Transport { timed_out: false, .. }));
}

#[tokio::test]
async fn end_to_end_session_produces_six_suggestions() {
    let server = healthy_backend().await;
    mount_chat_reply(&server, "It is a demo.").await;
    let mut controller = controller(&server);

    controller
        .connect_repository("https://github.com/octo/demo")
        .await
        .unwrap();
    controller.generate_documentation().await.unwrap();

    let suggestions = controller.suggest_questions();
    assert_eq!(suggestions.len(), 6);
    assert!(suggestions.contains(&"What does main.py do?".to_string()));
    assert!(suggestions.contains(&"Explain the utils.py file".to_string()));

    let reply = controller.send_message("What is this?").await.unwrap();
    assert_eq!(reply, "It is a demo.");

    let roles: Vec<Role> = controller
        .session()
        .messages()
        .iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
}

#[tokio::test]
async fn chat_payload_carries_full_history() {
    let server = healthy_backend().await;
    mount_chat_reply(&server, "answer").await;
    let mut controller = controller(&server);

    controller
        .connect_repository("https://github.com/octo/demo")
        .await
        .unwrap();
    controller.generate_documentation().await.unwrap();
    controller.send_message("first").await.unwrap();
    controller.send_message("second").await.unwrap();

    let bodies = received_bodies(&server, "/api/chat-about-repository").await;
    assert_eq!(bodies.len(), 2);

    let last = &bodies[1];
    assert_eq!(last["message"], "second");
    assert_eq!(last["repository"]["owner"], "octo");
    assert_eq!(last["documentation"], demo_documentation()["json"]);
    assert_eq!(
        last["conversationHistory"],
        json!([
            {"role": "user", "content": "first"},
            {"role": "assistant", "content": "answer"},
            {"role": "user", "content": "second"}
        ])
    );
}

#[tokio::test]
async fn unhealthy_backend_blocks_connect_without_calling_it() {
    let server = MockServer::start().await;
    mount_health(&server, 500).await;
    Mock::given(method("POST"))
        .and(path("/api/connect-repository"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut controller = controller(&server);
    let err = controller
        .connect_repository("https://github.com/octo/demo")
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::BackendUnavailable));
    assert!(controller.session().repository().is_none());
}

#[tokio::test]
async fn chat_timeout_keeps_question_and_session() {
    let server = healthy_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/chat-about-repository"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"reply": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut controller = controller(&server);
    controller
        .connect_repository("https://github.com/octo/demo")
        .await
        .unwrap();
    controller.generate_documentation().await.unwrap();

    let err = controller.send_message("slow?").await.unwrap_err();

    assert!(matches!(err, ChatError::Transport { timed_out: true, .. }));
    assert_eq!(controller.session().messages().len(), 1);
    assert_eq!(controller.session().messages()[0].content, "slow?");
    assert!(controller.session().repository().is_some());
    assert!(controller.session().documentation().is_some());
}
