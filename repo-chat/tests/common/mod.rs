//! Shared fixtures: a wiremock stand-in for the chat backend.

#![allow(dead_code)]

use repo_chat::config::BackendSettings;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn demo_repository() -> Value {
    json!({
        "owner": "octo",
        "name": "demo",
        "defaultBranch": "main",
        "url": "https://github.com/octo/demo",
        "description": "Demo repository",
        "fileStructure": [
            {"path": "main.py", "type": "file"},
            {"path": "utils.py", "type": "file"}
        ]
    })
}

pub fn demo_documentation() -> Value {
    json!({
        "json": {
            "summary": {
                "summary": "A demo",
                "technologies": ["py"],
                "mainComponents": ["core"]
            },
            "files": {"main.py": {}, "utils.py": {}}
        }
    })
}

/// Backend settings pointing at `server`, with short timeouts.
pub fn backend_settings(server: &MockServer) -> BackendSettings {
    BackendSettings {
        health_timeout_secs: 1,
        chat_timeout_secs: 1,
        ..BackendSettings::with_base_url(format!("{}/api", server.uri()))
    }
}

pub async fn mount_health(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"status": "ok"})))
        .mount(server)
        .await;
}

pub async fn mount_connect(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/connect-repository"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "repository": demo_repository()
        })))
        .mount(server)
        .await;
}

pub async fn mount_generate(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/generate-documentation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "documentation": demo_documentation()
        })))
        .mount(server)
        .await;
}

pub async fn mount_chat_reply(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat-about-repository"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": reply})))
        .mount(server)
        .await;
}

/// A healthy backend that answers every operation.
pub async fn healthy_backend() -> MockServer {
    let server = MockServer::start().await;
    mount_health(&server, 200).await;
    mount_connect(&server).await;
    mount_generate(&server).await;
    server
}

/// Bodies of all requests received on `request_path`, in arrival order.
pub async fn received_bodies(server: &MockServer, request_path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
        .collect()
}
