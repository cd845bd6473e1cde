//! API handlers.

mod auth;
mod chat;
mod misc;
mod threads;

pub use auth::{LoginRequest, LoginResponse, UserInfo, login, logout, me};
pub use chat::{ChatProxyRequest, ChatProxyResponse, chat_proxy};
pub use misc::{HealthResponse, healthz, index};
pub use threads::{
    CreateThreadRequest, RenameThreadRequest, SendMessageRequest, create_thread, delete_thread,
    ensure_thread, list_messages, list_threads, rename_thread, send_message,
};
