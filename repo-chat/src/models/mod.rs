pub mod documentation;
pub mod message;
pub mod repository;
pub mod session;

pub use documentation::{Documentation, DocumentationSummary};
pub use message::{ChatMessage, Role};
pub use repository::Repository;
pub use session::{DocumentationOverview, RepositoryInfo, Session, SessionState, SessionView};
