//! Configuration activation.
//!
//! cross-seed only rereads its config on start, so making a new blocklist
//! take effect means restarting its container.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::types::{Result, SyncError};

/// Makes an updated configuration take effect.
#[async_trait]
pub trait ActivationTrigger: Send + Sync {
    async fn activate(&self) -> Result<()>;
}

const DEFAULT_RESTART_TIMEOUT: Duration = Duration::from_secs(30);

/// Restarts a docker container by name.
#[derive(Debug, Clone)]
pub struct DockerRestart {
    container: String,
    timeout: Duration,
}

impl DockerRestart {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            timeout: DEFAULT_RESTART_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn failed(&self, reason: impl Into<String>) -> SyncError {
        SyncError::ActivationFailed {
            container: self.container.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ActivationTrigger for DockerRestart {
    async fn activate(&self) -> Result<()> {
        let result = tokio::time::timeout(
            self.timeout,
            Command::new("docker")
                .args(["restart", &self.container])
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.failed(e.to_string())),
            Err(_) => {
                return Err(self.failed(format!(
                    "docker restart timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(stderr.trim().to_string()));
        }

        info!("Successfully restarted {}", self.container);
        Ok(())
    }
}
