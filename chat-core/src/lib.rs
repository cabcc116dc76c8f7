//! chat-core: shared infrastructure for the repo-chat frontend.
pub mod config;
pub mod middleware;
pub mod observability;
