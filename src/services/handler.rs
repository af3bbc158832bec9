//! External update-handler invocation.
//!
//! The handler is a script outside this process: it receives the canonical
//! command as a JSON document on stdin and signals success with exit
//! status 0. Every invocation is bounded by a hard timeout; a handler that
//! outlives it is killed while the request is failed back to the caller.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::services::UpdateCommand;
use crate::types::HandlerError;

/// Settings for one handler invocation.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub script: PathBuf,
    pub timeout: Duration,
}

/// Run the handler once for one command.
pub async fn invoke(config: &HandlerConfig, command: &UpdateCommand) -> Result<(), HandlerError> {
    let input = serde_json::to_vec(command)
        .map_err(|e| HandlerError::Invocation(std::io::Error::other(e)))?;

    debug!(
        script = %config.script.display(),
        container = %command.container,
        "invoking update handler"
    );

    let mut child = Command::new(&config.script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(&input).await?;
        // Dropping the handle closes the pipe so the handler sees EOF.
    }

    // kill_on_drop reaps the child if the timeout abandons this future.
    let output = match tokio::time::timeout(config.timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => return Err(HandlerError::Timeout),
    };

    if !output.status.success() {
        return Err(HandlerError::Failed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}
