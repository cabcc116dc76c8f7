//! Router construction and server lifecycle.

use crate::config::Settings;
use crate::handlers::{
    app::{health_check, metrics},
    session::{
        backend_health, clear_chat, connect_repository, generate_documentation, get_session,
        send_message, suggestions,
    },
};
use crate::services::{HttpBackend, RepositoryBackend, SessionRegistry};
use crate::AppState;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use chat_core::middleware::{metrics_middleware, request_id_middleware};
use chat_core::observability::{extract_request_id, extract_traceparent};
use std::net::SocketAddr;
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

pub fn build_router(state: AppState, session_expiry: Duration) -> Router {
    // Chat state is per browser session and lives only as long as the process.
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(session_expiry));

    let api = Router::new()
        .route("/backend/health", get(backend_health))
        .route("/session", get(get_session))
        .route("/repository", post(connect_repository))
        .route("/documentation", post(generate_documentation))
        .route("/chat", post(send_message).delete(clear_chat))
        .route("/suggestions", get(suggestions))
        .layer(session_layer);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest("/api", api)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let headers = request.headers();
                let request_id = extract_request_id(headers).unwrap_or_else(|| "-".to_string());
                let traceparent = extract_traceparent(headers).unwrap_or_default();

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    traceparent = %traceparent,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Bound listener plus router, ready to serve.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    backend: Arc<dyn RepositoryBackend>,
    sessions: SessionRegistry,
    session_expiry: Duration,
}

impl Application {
    pub async fn build(settings: &Settings) -> std::io::Result<Self> {
        let backend: Arc<dyn RepositoryBackend> =
            Arc::new(HttpBackend::new(settings.backend.clone()));

        tracing::info!(base_url = %settings.backend.base_url, "Configured chat backend");

        let state = AppState::new(backend.clone());
        let sessions = state.sessions.clone();
        let session_expiry = Duration::hours(settings.server.session_expiry_hours);
        let router = build_router(state, session_expiry);

        let address = format!("{}:{}", settings.server.host, settings.server.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            e
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
            backend,
            sessions,
            session_expiry,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Probe the backend once, as done before serving.
    pub async fn backend_available(&self) -> bool {
        self.backend.health_check(None).await
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Starting repo-chat on port {}", self.port);

        let sweeper = tokio::spawn(sweep_idle_sessions(self.sessions, self.session_expiry));

        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        sweeper.abort();
        result
    }
}

const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);

/// Drop chat state of sessions whose cookie has expired.
async fn sweep_idle_sessions(sessions: SessionRegistry, session_expiry: Duration) {
    let max_idle = std::time::Duration::try_from(session_expiry).unwrap_or(SWEEP_INTERVAL);
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        interval.tick().await;
        let purged = sessions.purge_idle(max_idle);
        if purged > 0 {
            tracing::info!(purged, remaining = sessions.len(), "Purged idle chat sessions");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
