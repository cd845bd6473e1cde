//! Application configuration.
//!
//! A single optional TOML file plus the two environment overrides the
//! deployment surface promises: `OPENAI_API_KEY` for the upstream
//! credential and `PORT` for the listen port. Environment wins over the
//! file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::AuthConfig;

/// Environment variable holding the upstream credential.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable overriding the listen port.
pub const ENV_PORT: &str = "PORT";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub upstream: UpstreamConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_address: String,
    /// Listen port.
    pub port: u16,
    /// Directory of static assets to serve at `/`. The embedded chat
    /// page is served when unset.
    pub static_dir: Option<PathBuf>,
    /// SQLite database path.
    pub database_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
            database_path: PathBuf::from("charla.db"),
        }
    }
}

/// Upstream completion API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature sent with every request.
    pub temperature: f32,
    /// API credential. Normally injected via `OPENAI_API_KEY`; never
    /// exposed to clients.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.6,
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply `OPENAI_API_KEY` and `PORT` from the process environment.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(ENV_API_KEY)
            && !key.is_empty()
        {
            self.upstream.api_key = Some(key);
        }

        if let Ok(port) = std::env::var(ENV_PORT)
            && let Ok(port) = port.parse::<u16>()
        {
            self.server.port = port;
        }
    }

    /// Validate the configuration for serving.
    pub fn validate(&self) -> Result<()> {
        self.auth
            .validate()
            .context("invalid [auth] configuration")?;
        Ok(())
    }
}
