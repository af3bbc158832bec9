//! seedgate - cross-seed blocklist reconciliation run
//!
//! Keeps cross-seed from searching for torrents whose media was deleted
//! from Radarr/Sonarr while leaving them seeding in qBittorrent.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seedgate::activate::DockerRestart;
use seedgate::artifact::ConfigArtifact;
use seedgate::config::SyncArgs;
use seedgate::run::ReconciliationRun;
use seedgate::sources::{ArrClient, ArrConfig, IdentitySource, QbitClient, QbitConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = SyncArgs::parse();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("seedgate={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  seedgate - cross-seed filter sync");
    info!("======================================");
    info!("Radarr: {}", args.radarr_url);
    info!("Sonarr: {}", args.sonarr_url);
    info!("qBittorrent: {}", args.qbittorrent_url);
    info!("Artifact: {}", args.config_path.display());
    info!("Container: {}", args.container);
    info!("======================================");

    let timeout = args.request_timeout();
    let radarr = ArrClient::radarr(ArrConfig {
        base_url: args.radarr_url.clone(),
        api_key: args.radarr_api_key.clone(),
        history_page_size: args.history_page_size,
        request_timeout: timeout,
    });
    let sonarr = ArrClient::sonarr(ArrConfig {
        base_url: args.sonarr_url.clone(),
        api_key: args.sonarr_api_key.clone(),
        history_page_size: args.history_page_size,
        request_timeout: timeout,
    });
    let qbittorrent = QbitClient::new(QbitConfig {
        base_url: args.qbittorrent_url.clone(),
        username: args.qbittorrent_username.clone(),
        password: args.qbittorrent_password.clone(),
        request_timeout: timeout,
    });

    let mut run = ReconciliationRun::new(
        vec![
            Arc::new(radarr) as Arc<dyn IdentitySource>,
            Arc::new(sonarr) as Arc<dyn IdentitySource>,
        ],
        Arc::new(qbittorrent),
        Arc::new(ConfigArtifact::new(args.config_path.clone())),
        Arc::new(DockerRestart::new(args.container.clone())),
        args.protected_category.clone(),
    );

    match run.execute().await {
        Ok(report) => {
            info!("======================================");
            info!("Sync completed successfully");
            for (label, count) in &report.managed_counts {
                info!("  - {} hashes: {}", label, count);
            }
            info!("  - Total managed hashes: {}", report.managed_total);
            info!("  - Total qBittorrent torrents: {}", report.inventory_total);
            info!("  - Torrents blocked: {}", report.blocked);
            info!("  - Torrents searchable: {}", report.searchable());
            info!("======================================");
            Ok(())
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            std::process::exit(1);
        }
    }
}
