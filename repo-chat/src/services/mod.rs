pub mod backend_client;
pub mod controller;
pub mod registry;
pub mod suggestions;

pub use backend_client::{HttpBackend, RepositoryBackend};
pub use controller::{session_view, SessionController};
pub use registry::{SessionLease, SessionRegistry};
pub use suggestions::suggest_questions;
