//! JWT claims.

use serde::{Deserialize, Serialize};

/// Claims carried in a session token. The subject/email pair is the
/// principal; everything else is standard JWT bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the stable user ID.
    pub sub: String,
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Expiration (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Claims {
    /// Display name, falling back to the user ID.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let mut claims = Claims {
            sub: "u1".to_string(),
            iss: None,
            exp: 0,
            iat: None,
            email: "u1@example.com".to_string(),
            name: None,
        };
        assert_eq!(claims.display_name(), "u1");

        claims.name = Some("User One".to_string());
        assert_eq!(claims.display_name(), "User One");
    }
}
