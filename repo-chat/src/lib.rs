pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use services::{RepositoryBackend, SessionRegistry};
use std::sync::Arc;

/// Shared application state: the backend client and the chat sessions.
///
/// The cookie only carries a session key; the chat state itself lives in
/// `sessions`.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn RepositoryBackend>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(backend: Arc<dyn RepositoryBackend>) -> Self {
        Self {
            backend,
            sessions: SessionRegistry::new(),
        }
    }
}
