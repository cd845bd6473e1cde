//! Application state shared across handlers.
//!
//! Constructed once at startup and threaded through the router; there is
//! no ambient module state.

use std::sync::Arc;

use crate::auth::AuthState;
use crate::chat::{ChatRepository, SessionService};
use crate::db::Database;
use crate::relay::RelayService;
use crate::transcript::TranscriptHub;
use crate::upstream::CompletionApi;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chat storage.
    pub repo: ChatRepository,
    /// Session manager owning the active-thread pointers.
    pub sessions: Arc<SessionService>,
    /// Message relay.
    pub relay: Arc<RelayService>,
    /// Upstream completion backend (trait object so tests can script it).
    pub completion: Arc<dyn CompletionApi>,
    /// Transcript subscription hub.
    pub hub: Arc<TranscriptHub>,
    /// Authentication state.
    pub auth: AuthState,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, completion: Arc<dyn CompletionApi>, auth: AuthState) -> Self {
        let repo = ChatRepository::new(db);
        let hub = Arc::new(TranscriptHub::new());
        let sessions = Arc::new(SessionService::new(repo.clone()));
        let relay = Arc::new(RelayService::new(
            repo.clone(),
            completion.clone(),
            hub.clone(),
        ));

        Self {
            repo,
            sessions,
            relay,
            completion,
            hub,
            auth,
        }
    }
}
