use std::process::{Command as StdCommand, Stdio};
use tokio::process::Command;

use crate::types::{AppError, Result};

/// Runs `<program> -n <id>`. The child is killed if this future is dropped, which
/// is how the executor's timeout terminates a hung command.
pub async fn run_lxc_command(program: &str, id: &str) -> bool {
    tracing::debug!("Executing command: {} -n {}", program, id);
    let output = Command::new(program)
        .arg("-n")
        .arg(id)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            tracing::debug!("{} -n {} completed", program, id);
            true
        }
        Ok(output) => {
            tracing::warn!(
                "{} -n {} failed ({}): {}",
                program,
                id,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        }
        Err(e) => {
            tracing::warn!("Error executing {} -n {}: {}", program, id, e);
            false
        }
    }
}

pub fn attach_container(id: &str) -> Result<()> {
    // std Command so the session inherits the terminal directly
    let status = StdCommand::new("lxc-attach").arg("-n").arg(id).spawn()?.wait()?;

    if !status.success() {
        return Err(AppError::Other(format!(
            "lxc-attach exited with {} for container {}",
            status, id
        )));
    }
    Ok(())
}
