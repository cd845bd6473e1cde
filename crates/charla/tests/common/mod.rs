//! Test utilities and common setup.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use charla::api::{AppState, create_router};
use charla::auth::{AuthConfig, AuthState, ChatUser};
use charla::db::Database;
use charla::upstream::{ChatTurn, CompletionApi, UpstreamError, UpstreamResult};

/// JWT secret used across integration tests.
const TEST_JWT_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Scripted outcome for the mock completion backend.
#[derive(Clone)]
pub enum MockOutcome {
    /// Answer with this reply text.
    Reply(String),
    /// Fail with this upstream status and body.
    Status(u16, String),
}

/// Mock completion backend recording every request it receives.
pub struct MockCompletion {
    outcome: MockOutcome,
    pub requests: Mutex<Vec<Vec<ChatTurn>>>,
}

impl MockCompletion {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: MockOutcome::Reply(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: MockOutcome::Status(status, body.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionApi for MockCompletion {
    async fn complete(&self, messages: Vec<ChatTurn>) -> UpstreamResult<String> {
        self.requests.lock().unwrap().push(messages);
        match &self.outcome {
            MockOutcome::Reply(reply) => Ok(reply.clone()),
            MockOutcome::Status(status, body) => Err(UpstreamError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

fn test_user(id: &str, email: &str, password: &str) -> ChatUser {
    ChatUser {
        id: id.to_string(),
        email: email.to_string(),
        name: id.to_string(),
        password_hash: bcrypt::hash(password, bcrypt::DEFAULT_COST).unwrap(),
    }
}

/// Auth config with a JWT secret and two known users.
fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some(TEST_JWT_SECRET.to_string()),
        users: vec![
            test_user("ana", "ana@example.com", "anapassword123"),
            test_user("bob", "bob@example.com", "bobpassword123"),
        ],
        allowed_origins: Vec::new(),
    }
}

/// Create a test application around a given completion backend.
pub async fn test_app_with(completion: Arc<MockCompletion>) -> Router {
    let db = Database::in_memory().await.unwrap();
    let auth = AuthState::new(test_auth_config());
    let state = AppState::new(db, completion, auth);
    create_router(state, None)
}

/// Create a test application with a mock upstream replying "hi there".
pub async fn test_app() -> Router {
    test_app_with(MockCompletion::replying("hi there")).await
}

/// Valid token for user "ana" under the shared test secret. Verifies
/// against any app built from `test_auth_config`.
pub fn test_token() -> String {
    let auth = AuthState::new(test_auth_config());
    auth.generate_token(&auth.users()[0]).unwrap()
}

/// Create a test application and a valid token for user "ana".
pub async fn test_app_with_token() -> (Router, String) {
    (test_app().await, test_token())
}

/// Create a test application plus tokens for both test users.
pub async fn test_app_with_two_tokens() -> (Router, String, String) {
    let auth = AuthState::new(test_auth_config());
    let ana = auth.generate_token(&auth.users()[0]).unwrap();
    let bob = auth.generate_token(&auth.users()[1]).unwrap();

    (test_app().await, ana, bob)
}
