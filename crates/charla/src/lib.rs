//! Charla backend library.
//!
//! A minimal authenticated web chat service: users own threads of
//! messages, prompts are relayed to an OpenAI-compatible completion API
//! with the credential held server-side, and transcripts stream over a
//! WebSocket append feed.

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod relay;
pub mod transcript;
pub mod upstream;
