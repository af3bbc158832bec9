//! Error taxonomy shared by the reconciliation core and the webhook
//! dispatcher.
//!
//! Reconciliation errors all abort the current run; none are retried here.
//! Retry-with-backoff belongs to whatever schedules the runs. Dispatcher
//! errors are per-request and never take the listener down.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Failures that move a reconciliation run to its terminal Failed state.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The upstream could not be reached, timed out, refused credentials,
    /// or answered with a non-success status.
    #[error("{origin} unavailable: {reason}")]
    SourceUnavailable { origin: String, reason: String },

    /// The upstream answered, but the response did not have the expected
    /// shape.
    #[error("{origin} returned a malformed response: {reason}")]
    SourceMalformed { origin: String, reason: String },

    #[error("cannot read config artifact {path}")]
    ArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write config artifact {path}")]
    ArtifactUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blockList field was not found in the artifact. Nothing was
    /// written; the run must not claim success over a drifted config.
    #[error("blockList field not found in config artifact - format has drifted")]
    ArtifactFormatDrift,

    #[error("failed to restart {container}: {reason}")]
    ActivationFailed { container: String, reason: String },
}

impl SyncError {
    pub fn unavailable(source: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            origin: source.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(source: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SourceMalformed {
            origin: source.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures invoking the external update handler. Each variant answers the
/// notification with a different HTTP status so the caller can tell them
/// apart.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("update handler timed out")]
    Timeout,

    #[error("update handler exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("failed to invoke update handler: {0}")]
    Invocation(#[from] std::io::Error),
}
