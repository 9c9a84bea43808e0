// HTTP server setup (Axum REST API)
pub mod app;
pub mod middleware;
pub mod routes;

pub use app::{build_app, AppState};
