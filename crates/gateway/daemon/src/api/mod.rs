//! HTTP API

pub mod caller;
pub mod handlers;
pub mod json;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
