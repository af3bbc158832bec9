//! Configuration for seedgate.
//!
//! CLI arguments and environment variable handling using clap. Both
//! binaries load their configuration exactly once at process start (after
//! `dotenvy::dotenv()`), validate it, and pass the pieces into component
//! constructors; nothing is mutated afterwards.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// seedgate - cross-seed blocklist reconciliation run
///
/// One invocation performs one full pass and exits; schedule it with cron
/// or a systemd timer.
#[derive(Parser, Debug, Clone)]
#[command(name = "seedgate")]
#[command(about = "Reconciles cross-seed's blockList with Radarr, Sonarr and qBittorrent")]
pub struct SyncArgs {
    /// Radarr base URL
    #[arg(long, env = "RADARR_URL", default_value = "http://localhost:7878")]
    pub radarr_url: String,

    /// Radarr API key
    #[arg(long, env = "RADARR_API_KEY")]
    pub radarr_api_key: String,

    /// Sonarr base URL
    #[arg(long, env = "SONARR_URL", default_value = "http://localhost:8989")]
    pub sonarr_url: String,

    /// Sonarr API key
    #[arg(long, env = "SONARR_API_KEY")]
    pub sonarr_api_key: String,

    /// qBittorrent WebUI base URL
    #[arg(long, env = "QBITTORRENT_URL", default_value = "http://localhost:8080")]
    pub qbittorrent_url: String,

    /// qBittorrent WebUI username
    #[arg(long, env = "QBITTORRENT_USERNAME", default_value = "admin")]
    pub qbittorrent_username: String,

    /// qBittorrent WebUI password
    #[arg(long, env = "QBITTORRENT_PASSWORD")]
    pub qbittorrent_password: String,

    /// Path to the cross-seed config.js to rewrite
    #[arg(
        long,
        env = "CROSS_SEED_CONFIG",
        default_value = "/var/lib/homelab-media-configs/cross-seed/config.js"
    )]
    pub config_path: PathBuf,

    /// Name of the cross-seed container restarted after an update
    #[arg(long, env = "CROSS_SEED_CONTAINER", default_value = "cross-seed")]
    pub container: String,

    /// Torrent category cross-seed assigns to its own injected copies;
    /// these are never blocked
    #[arg(long, env = "PROTECTED_CATEGORY", default_value = "cross-seed-link")]
    pub protected_category: String,

    /// History page size requested from Radarr/Sonarr
    #[arg(long, env = "HISTORY_PAGE_SIZE", default_value = "10000")]
    pub history_page_size: u32,

    /// Per-request timeout in seconds for upstream calls
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl SyncArgs {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.radarr_api_key.trim().is_empty() {
            return Err("RADARR_API_KEY must not be empty".to_string());
        }
        if self.sonarr_api_key.trim().is_empty() {
            return Err("SONARR_API_KEY must not be empty".to_string());
        }
        if self.qbittorrent_password.trim().is_empty() {
            return Err("QBITTORRENT_PASSWORD must not be empty".to_string());
        }
        if self.history_page_size == 0 {
            return Err("HISTORY_PAGE_SIZE must be positive".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT_SECS must be positive".to_string());
        }
        Ok(())
    }
}

/// seedgate-webhook - container update notification dispatcher
#[derive(Parser, Debug, Clone)]
#[command(name = "seedgate-webhook")]
#[command(about = "Receives WUD webhooks and triggers the local update handler")]
pub struct WebhookArgs {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8182")]
    pub listen: SocketAddr,

    /// Update handler script invoked once per notification
    #[arg(
        long,
        env = "UPDATE_HANDLER",
        default_value = "/scripts/wud-update-handler.sh"
    )]
    pub handler: PathBuf,

    /// Hard timeout in seconds for one handler invocation
    #[arg(long, env = "HANDLER_TIMEOUT_SECS", default_value = "300")]
    pub handler_timeout_secs: u64,

    /// Comma-separated, ordered list of container-name prefixes to strip
    /// (first match wins)
    #[arg(
        long,
        env = "CONTAINER_PREFIXES",
        default_value = "homelab-services-,homelab-torrent-,homelab-plex-"
    )]
    pub container_prefixes: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl WebhookArgs {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }

    /// Prefix list in strip-precedence order.
    pub fn prefix_list(&self) -> Vec<String> {
        self.container_prefixes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.handler_timeout_secs == 0 {
            return Err("HANDLER_TIMEOUT_SECS must be positive".to_string());
        }
        if self.handler.as_os_str().is_empty() {
            return Err("UPDATE_HANDLER must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_list_preserves_order_and_drops_blanks() {
        let args = WebhookArgs::parse_from([
            "seedgate-webhook",
            "--handler-timeout-secs",
            "300",
            "--container-prefixes",
            "homelab-services-, homelab-torrent-,,homelab-plex-",
        ]);

        assert_eq!(
            args.prefix_list(),
            vec![
                "homelab-services-".to_string(),
                "homelab-torrent-".to_string(),
                "homelab-plex-".to_string(),
            ]
        );
    }

    #[test]
    fn test_sync_args_reject_empty_credentials() {
        let args = SyncArgs::parse_from([
            "seedgate",
            "--radarr-api-key",
            " ",
            "--sonarr-api-key",
            "key",
            "--qbittorrent-password",
            "secret",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_webhook_args_reject_zero_timeout() {
        let args = WebhookArgs::parse_from(["seedgate-webhook", "--handler-timeout-secs", "0"]);
        assert!(args.validate().is_err());
    }
}
