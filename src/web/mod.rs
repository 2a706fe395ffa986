//! Web server module
//!
//! JSON search API plus the streaming WebSocket endpoint.

mod handlers;
mod routes;
mod state;

pub use handlers::SearchRequest;
pub use routes::create_router;
pub use state::AppState;
