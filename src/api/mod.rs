/// API error types and handling
pub mod errors;
/// Request extractors
pub mod extract;
/// HTTP handlers
pub mod handlers;
/// Routes configuration and setup
pub mod routes;
/// HTTP server implementation
pub mod server;
/// State shared by the handlers
pub mod state;

pub use state::AppState;
