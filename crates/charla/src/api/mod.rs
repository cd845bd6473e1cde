//! HTTP API module.
//!
//! The gateway: REST endpoints, the completion proxy, the transcript
//! WebSocket, and static asset serving.

mod error;
pub mod handlers;
mod routes;
mod state;
mod ws;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
