//! Chat session manager.
//!
//! Owns the per-user active-thread pointer and guarantees the session
//! invariant: a signed-in user always has an active thread once any of
//! the entry points has run. The pointer is transient process state;
//! nothing here is persisted beyond what the repository writes.

use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use tracing::info;

use super::models::Thread;
use super::repository::ChatRepository;

/// Title given to a lazily created thread.
const DEFAULT_THREAD_TITLE: &str = "New chat";

/// Title used when an explicit create supplies none.
const UNTITLED_THREAD_TITLE: &str = "Untitled";

/// Session manager mapping signed-in users to their active thread.
pub struct SessionService {
    repo: ChatRepository,
    /// User ID -> active thread ID. Mutated only by the entry points
    /// below, each triggered by a discrete user action.
    active: DashMap<String, String>,
}

impl SessionService {
    /// Create a new session service.
    pub fn new(repo: ChatRepository) -> Self {
        Self {
            repo,
            active: DashMap::new(),
        }
    }

    /// Currently active thread for a user, if one has been adopted.
    pub fn active_thread(&self, user_id: &str) -> Option<String> {
        self.active.get(user_id).map(|id| id.value().clone())
    }

    /// Ensure the user has an active thread, creating one if they have
    /// none at all.
    ///
    /// An already-held pointer short-circuits the collection scan; a
    /// stale pointer (thread deleted from another session) is dropped
    /// and re-resolved.
    pub async fn ensure_thread(&self, user_id: &str) -> Result<Thread> {
        if let Some(thread_id) = self.active_thread(user_id) {
            if let Some(thread) = self.repo.get_thread(user_id, &thread_id).await? {
                return Ok(thread);
            }
            self.active.remove(user_id);
        }

        if let Some(thread) = self.repo.first_thread(user_id).await? {
            self.active.insert(user_id.to_string(), thread.id.clone());
            return Ok(thread);
        }

        let thread = self
            .repo
            .create_thread(user_id, DEFAULT_THREAD_TITLE)
            .await
            .context("creating initial thread")?;
        info!(user_id = %user_id, thread_id = %thread.id, "Created initial thread");

        self.active.insert(user_id.to_string(), thread.id.clone());
        Ok(thread)
    }

    /// Unconditionally create a thread and adopt it as active.
    pub async fn create_thread(&self, user_id: &str, title: Option<&str>) -> Result<Thread> {
        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => UNTITLED_THREAD_TITLE,
        };

        let thread = self.repo.create_thread(user_id, title).await?;
        info!(user_id = %user_id, thread_id = %thread.id, "Created thread");

        self.active.insert(user_id.to_string(), thread.id.clone());
        Ok(thread)
    }

    /// Delete a thread and its message subtree, then immediately
    /// re-ensure so the user is never left without an active thread.
    /// Returns the thread that is active afterwards.
    pub async fn delete_thread(&self, user_id: &str, thread_id: &str) -> Result<Thread> {
        self.repo
            .get_thread(user_id, thread_id)
            .await?
            .ok_or_else(|| anyhow!("thread {} not found", thread_id))?;

        self.repo.delete_thread(thread_id).await?;
        self.active.remove(user_id);
        info!(user_id = %user_id, thread_id = %thread_id, "Deleted thread");

        self.ensure_thread(user_id).await
    }

    /// Merge a new title into a thread. An empty or whitespace-only
    /// title is a no-op returning the stored record unchanged.
    pub async fn rename_thread(
        &self,
        user_id: &str,
        thread_id: &str,
        new_title: &str,
    ) -> Result<Thread> {
        let thread = self
            .repo
            .get_thread(user_id, thread_id)
            .await?
            .ok_or_else(|| anyhow!("thread {} not found", thread_id))?;

        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Ok(thread);
        }

        self.repo.rename_thread(thread_id, new_title).await?;
        info!(user_id = %user_id, thread_id = %thread_id, title = %new_title, "Renamed thread");

        self.repo
            .get_thread(user_id, thread_id)
            .await?
            .ok_or_else(|| anyhow!("thread {} not found after rename", thread_id))
    }

    /// Drop the user's active pointer (sign-out). Stored data is
    /// untouched.
    pub fn clear(&self, user_id: &str) {
        self.active.remove(user_id);
    }
}
