//! seedgate-webhook - container update notification dispatcher
//!
//! Long-lived listener: accepts POSTed container-update notifications from
//! What's Up Docker, normalizes them, and invokes the local update handler
//! with a canonical {container, image, tag} document on stdin.
//!
//! Usage:
//!   seedgate-webhook --listen 0.0.0.0:8182 --handler /scripts/wud-update-handler.sh
//!
//! Environment variables:
//!   LISTEN - listen address (default: 0.0.0.0:8182)
//!   UPDATE_HANDLER - handler script path
//!   HANDLER_TIMEOUT_SECS - per-invocation timeout (default: 300)
//!   CONTAINER_PREFIXES - ordered prefixes stripped from container names
//!   LOG_LEVEL - log level (default: info)

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seedgate::config::WebhookArgs;
use seedgate::server::{self, AppState, ServerConfig};
use seedgate::services::HandlerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = WebhookArgs::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("seedgate={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Starting webhook listener on {}", args.listen);
    info!("Handler script: {}", args.handler.display());
    info!("Handler timeout: {}s", args.handler_timeout_secs);

    let state = Arc::new(AppState {
        config: ServerConfig {
            listen: args.listen,
            prefixes: args.prefix_list(),
        },
        handler: HandlerConfig {
            script: args.handler.clone(),
            timeout: args.handler_timeout(),
        },
    });

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
