//! Charla server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use charla::api::{AppState, create_router};
use charla::auth::AuthState;
use charla::config::AppConfig;
use charla::db::Database;
use charla::upstream::CompletionClient;

#[derive(Parser, Debug)]
#[command(name = "charla")]
#[command(about = "Minimal authenticated web chat backend with an LLM relay")]
#[command(version)]
struct Cli {
    /// Config file path (optional)
    #[arg(short, long, env = "CHARLA_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "charla=debug,tower_http=debug"
    } else {
        "charla=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    if config.upstream.api_key.is_none() {
        warn!(
            "No upstream API key configured ({} unset); completions will fail",
            charla::config::ENV_API_KEY
        );
    }
    if config.auth.users.is_empty() {
        warn!("No users configured under [auth]; nobody can sign in");
    }

    let db = Database::open(&config.server.database_path).await?;
    let completion = Arc::new(CompletionClient::new(&config.upstream));
    let auth = AuthState::new(config.auth.clone());

    let state = AppState::new(db, completion, auth);
    let app = create_router(state, config.server.static_dir.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("parsing bind address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
