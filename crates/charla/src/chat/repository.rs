//! Repository for thread and message storage.
//!
//! All writes go through here: thread creation uses push-generated ids,
//! message appends receive a store-assigned insertion sequence, and the
//! only whole-row mutation is the title merge. Messages are never edited
//! or deleted individually; the subtree goes away with its thread.

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::db::Database;

use super::models::{Message, Role, Thread};

/// Repository for chat storage operations.
#[derive(Clone)]
pub struct ChatRepository {
    db: Database,
}

impl ChatRepository {
    /// Create a new repository instance.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ========== Thread Operations ==========

    /// Create a thread with a generated id.
    pub async fn create_thread(&self, user_id: &str, title: &str) -> Result<Thread> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO threads (id, user_id, title, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(user_id)
            .bind(title)
            .bind(&created_at)
            .execute(self.db.pool())
            .await
            .context("inserting thread")?;

        Ok(Thread {
            id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            created_at,
        })
    }

    /// Get a thread, scoped to its owner.
    pub async fn get_thread(&self, user_id: &str, thread_id: &str) -> Result<Option<Thread>> {
        sqlx::query_as::<_, Thread>(
            "SELECT id, user_id, title, created_at FROM threads WHERE id = ? AND user_id = ?",
        )
        .bind(thread_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await
        .context("fetching thread")
    }

    /// List a user's threads in insertion order.
    pub async fn list_threads(&self, user_id: &str) -> Result<Vec<Thread>> {
        sqlx::query_as::<_, Thread>(
            r#"
            SELECT id, user_id, title, created_at
            FROM threads
            WHERE user_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await
        .context("listing threads")
    }

    /// First-enumerated thread for a user, if any.
    pub async fn first_thread(&self, user_id: &str) -> Result<Option<Thread>> {
        sqlx::query_as::<_, Thread>(
            r#"
            SELECT id, user_id, title, created_at
            FROM threads
            WHERE user_id = ?
            ORDER BY created_at ASC, rowid ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await
        .context("fetching first thread")
    }

    /// Merge a new title into a thread record.
    pub async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<()> {
        sqlx::query("UPDATE threads SET title = ? WHERE id = ?")
            .bind(title)
            .bind(thread_id)
            .execute(self.db.pool())
            .await
            .context("renaming thread")?;
        Ok(())
    }

    /// Delete a thread and its entire message subtree.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM messages WHERE thread_id = ?")
            .bind(thread_id)
            .execute(self.db.pool())
            .await
            .context("deleting thread messages")?;

        sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(thread_id)
            .execute(self.db.pool())
            .await
            .context("deleting thread")?;
        Ok(())
    }

    /// Count a user's threads.
    pub async fn count_threads(&self, user_id: &str) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threads WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await
            .context("counting threads")
    }

    // ========== Message Operations ==========

    /// Append a message to a thread, returning the stored row.
    pub async fn append_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message> {
        let id = Uuid::new_v4().to_string();
        let ts = Utc::now().timestamp_millis();

        let seq = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO messages (id, thread_id, role, content, ts)
            VALUES (?, ?, ?, ?, ?)
            RETURNING seq
            "#,
        )
        .bind(&id)
        .bind(thread_id)
        .bind(role.to_string())
        .bind(content)
        .bind(ts)
        .fetch_one(self.db.pool())
        .await
        .context("appending message")?;

        Ok(Message {
            seq,
            id,
            thread_id: thread_id.to_string(),
            role: role.to_string(),
            content: content.to_string(),
            ts,
        })
    }

    /// List a thread's messages in insertion order.
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT seq, id, thread_id, role, content, ts
            FROM messages
            WHERE thread_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(thread_id)
        .fetch_all(self.db.pool())
        .await
        .context("listing messages")
    }

    /// Count a thread's messages.
    pub async fn count_messages(&self, thread_id: &str) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_one(self.db.pool())
            .await
            .context("counting messages")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> ChatRepository {
        let db = Database::in_memory().await.unwrap();
        ChatRepository::new(db)
    }

    #[tokio::test]
    async fn test_thread_crud() {
        let repo = setup().await;

        // Create
        let thread = repo.create_thread("u1", "New chat").await.unwrap();
        assert_eq!(thread.title, "New chat");
        assert_eq!(thread.user_id, "u1");

        // Read
        let fetched = repo.get_thread("u1", &thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, thread.id);

        // Ownership scoping
        let other = repo.get_thread("u2", &thread.id).await.unwrap();
        assert!(other.is_none());

        // Rename
        repo.rename_thread(&thread.id, "Renamed").await.unwrap();
        let fetched = repo.get_thread("u1", &thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Renamed");

        // Delete
        repo.delete_thread(&thread.id).await.unwrap();
        assert!(repo.get_thread("u1", &thread.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_threads_insertion_order() {
        let repo = setup().await;

        let first = repo.create_thread("u1", "first").await.unwrap();
        let second = repo.create_thread("u1", "second").await.unwrap();
        repo.create_thread("u2", "other user").await.unwrap();

        let threads = repo.list_threads("u1").await.unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, first.id);
        assert_eq!(threads[1].id, second.id);

        let head = repo.first_thread("u1").await.unwrap().unwrap();
        assert_eq!(head.id, first.id);
    }

    #[tokio::test]
    async fn test_messages_insertion_order() {
        let repo = setup().await;
        let thread = repo.create_thread("u1", "chat").await.unwrap();

        let m1 = repo
            .append_message(&thread.id, Role::User, "hello")
            .await
            .unwrap();
        let m2 = repo
            .append_message(&thread.id, Role::Assistant, "hi there")
            .await
            .unwrap();
        assert!(m2.seq > m1.seq);

        let messages = repo.list_messages(&thread.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[0].role(), Role::User);
        assert_eq!(messages[1].content, "hi there");
        assert_eq!(messages[1].role(), Role::Assistant);
    }

    #[tokio::test]
    async fn test_delete_thread_removes_subtree() {
        let repo = setup().await;
        let thread = repo.create_thread("u1", "chat").await.unwrap();
        repo.append_message(&thread.id, Role::User, "hello")
            .await
            .unwrap();
        repo.append_message(&thread.id, Role::Assistant, "hi")
            .await
            .unwrap();

        repo.delete_thread(&thread.id).await.unwrap();

        assert_eq!(repo.count_threads("u1").await.unwrap(), 0);
        assert_eq!(repo.count_messages(&thread.id).await.unwrap(), 0);
    }
}
