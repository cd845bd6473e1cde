//! Chat domain: thread/message records, storage, and session management.

mod models;
mod repository;
mod service;

pub use models::{Message, Role, Thread};
pub use repository::ChatRepository;
pub use service::SessionService;
