//! Authentication middleware.

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;
use tracing::warn;

use super::{AuthConfig, AuthError, ChatUser, Claims};

/// Session cookie name.
pub const AUTH_COOKIE: &str = "auth_token";

/// Token lifetime in seconds (24 hours).
const TOKEN_TTL_SECS: i64 = 3600 * 24;

/// Extract a Bearer token from an Authorization header value.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    if parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

pub(crate) fn token_from_cookie_header<'a>(
    cookie_header: &'a str,
    cookie_name: &str,
) -> Option<&'a str> {
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() == cookie_name {
            Some(value.trim())
        } else {
            None
        }
    })
}

/// Authentication state shared across handlers.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
    decoding_key: Option<DecodingKey>,
}

impl AuthState {
    /// Create new auth state from config.
    /// Resolves `env:VAR_NAME` syntax in jwt_secret at construction time.
    pub fn new(mut config: AuthConfig) -> Self {
        if let Ok(Some(resolved)) = config.resolve_jwt_secret() {
            config.jwt_secret = Some(resolved);
        }

        let decoding_key = config
            .jwt_secret
            .as_ref()
            .map(|s| DecodingKey::from_secret(s.as_bytes()));

        Self {
            config: Arc::new(config),
            decoding_key,
        }
    }

    /// Get allowed CORS origins from config.
    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    /// Configured users.
    pub fn users(&self) -> &[ChatUser] {
        &self.config.users
    }

    /// Verify credentials against the configured users.
    /// Accepts either the user ID or the email as the username.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Option<&ChatUser> {
        self.config
            .users
            .iter()
            .find(|u| (u.id == username || u.email == username) && u.verify_password(password))
    }

    /// Validate a JWT token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let decoding_key = self
            .decoding_key
            .as_ref()
            .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear(); // Allow missing iss/aud

        let token_data = decode::<Claims>(token, decoding_key, &validation).map_err(|e| {
            warn!("JWT validation failed: {:?}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Generate a session token for a user.
    pub fn generate_token(&self, user: &ChatUser) -> Result<String, AuthError> {
        let secret = self
            .config
            .jwt_secret
            .as_ref()
            .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?;

        let claims = Claims {
            sub: user.id.clone(),
            iss: Some("charla".to_string()),
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
            iat: Some(Utc::now().timestamp()),
            email: user.email.clone(),
            name: Some(user.name.clone()),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

/// Authenticated principal extracted from the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User claims.
    pub claims: Claims,
}

impl CurrentUser {
    /// Get the user ID.
    pub fn id(&self) -> &str {
        &self.claims.sub
    }

    /// Get the email address.
    pub fn email(&self) -> &str {
        &self.claims.email
    }

    /// Get display name.
    pub fn display_name(&self) -> &str {
        self.claims.display_name()
    }
}

/// Extract authentication from request.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Authentication middleware.
///
/// Validates session tokens and injects `CurrentUser` into request
/// extensions. Supports multiple auth methods in priority order:
/// 1. Authorization: Bearer <token> header
/// 2. auth_token cookie
/// 3. token query parameter (for WebSocket connections)
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    // Cookie auth for browser clients (WebSocket/EventSource cannot set
    // custom headers).
    let cookie_token = req
        .headers()
        .get(axum::http::header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookie_header| token_from_cookie_header(cookie_header, AUTH_COOKIE));

    // Token in query parameter for WebSocket connections.
    let query_token = req.uri().query().and_then(|q| {
        q.split('&').find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next()?;
            if key == "token" {
                urlencoding::decode(value).ok().map(|s| s.into_owned())
            } else {
                None
            }
        })
    });

    let claims = if let Some(header) = auth_header {
        let token = bearer_token_from_header(header)?;
        auth.validate_token(token)?
    } else if let Some(token) = cookie_token {
        auth.validate_token(token)?
    } else if let Some(ref token) = query_token {
        auth.validate_token(token)?
    } else {
        return Err(AuthError::MissingAuthHeader);
    };

    let user = CurrentUser { claims };
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_from_header_valid() {
        assert_eq!(
            bearer_token_from_header("Bearer abc.def.ghi").unwrap(),
            "abc.def.ghi"
        );
        assert_eq!(
            bearer_token_from_header("bearer   token123").unwrap(),
            "token123"
        );
    }

    #[test]
    fn test_bearer_token_from_header_invalid() {
        let cases = [
            "",
            "Bearer",
            "Bearer ",
            "Token something",
            "Bearer token extra",
            "bear token",
        ];

        for case in cases {
            assert!(
                bearer_token_from_header(case).is_err(),
                "{case} should fail"
            );
        }
    }

    #[test]
    fn test_token_from_cookie_header() {
        let header = "theme=dark; auth_token=abc.def; other=1";
        assert_eq!(
            token_from_cookie_header(header, AUTH_COOKIE),
            Some("abc.def")
        );
        assert_eq!(token_from_cookie_header("theme=dark", AUTH_COOKIE), None);
    }

    fn make_user(id: &str, email: &str, password: &str) -> ChatUser {
        let password_hash =
            bcrypt::hash(password, bcrypt::DEFAULT_COST).expect("Failed to hash password");

        ChatUser {
            id: id.to_string(),
            email: email.to_string(),
            name: id.to_string(),
            password_hash,
        }
    }

    fn test_state() -> AuthState {
        let config = AuthConfig {
            jwt_secret: Some("test-secret-for-unit-tests-minimum-32-chars".to_string()),
            users: vec![make_user("ana", "ana@example.com", "anapassword123")],
            allowed_origins: Vec::new(),
        };
        AuthState::new(config)
    }

    #[test]
    fn test_verify_credentials() {
        let state = test_state();

        assert!(state.verify_credentials("ana", "anapassword123").is_some());
        assert!(
            state
                .verify_credentials("ana@example.com", "anapassword123")
                .is_some()
        );
        assert!(state.verify_credentials("ana", "wrong").is_none());
        assert!(state.verify_credentials("nobody", "anapassword123").is_none());
    }

    #[test]
    fn test_generate_and_validate_token() {
        let state = test_state();
        let user = &state.users()[0];

        let token = state.generate_token(user).unwrap();
        let claims = state.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "ana");
        assert_eq!(claims.email, "ana@example.com");
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let state = test_state();
        assert!(state.validate_token("not.a.token").is_err());
    }

    #[test]
    fn test_current_user_accessors() {
        let claims = Claims {
            sub: "u1".to_string(),
            iss: None,
            exp: Utc::now().timestamp() + 3600,
            iat: None,
            email: "u1@example.com".to_string(),
            name: Some("User One".to_string()),
        };

        let user = CurrentUser { claims };
        assert_eq!(user.id(), "u1");
        assert_eq!(user.email(), "u1@example.com");
        assert_eq!(user.display_name(), "User One");
    }
}
