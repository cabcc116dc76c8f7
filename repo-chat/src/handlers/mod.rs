pub mod app;
pub mod session;
