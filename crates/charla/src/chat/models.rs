//! Chat data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Role of a chat message. Closed set; validated before anything is
/// written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            _ => Err(format!("Unknown message role: {}", s)),
        }
    }
}

/// A chat thread owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Thread {
    /// Store-generated identifier.
    pub id: String,
    /// Owning user ID.
    pub user_id: String,
    /// Display title.
    pub title: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// A message stored under a thread.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Store-assigned insertion sequence (the only ordering guarantee).
    pub seq: i64,
    /// Store-generated identifier.
    pub id: String,
    /// Thread this message belongs to.
    pub thread_id: String,
    /// Message role (user, assistant, system).
    pub role: String,
    /// Message text.
    pub content: String,
    /// Unix timestamp in milliseconds.
    pub ts: i64,
}

impl Message {
    /// Parsed role. Anything unrecognized renders as the assistant
    /// variant, matching the transcript's user-or-bot split.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::User, Role::Assistant, Role::System] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_message_role_falls_back_to_assistant() {
        let message = Message {
            seq: 1,
            id: "m1".to_string(),
            thread_id: "t1".to_string(),
            role: "weird".to_string(),
            content: "hi".to_string(),
            ts: 0,
        };
        assert_eq!(message.role(), Role::Assistant);
    }
}
