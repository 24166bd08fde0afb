use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::project_dirs;

/// The terminal belongs to the dashboard, so logs only ever go to a file.
pub fn default_log_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().join("debug.log"))
        .unwrap_or_else(|| PathBuf::from("lxcdash-debug.log"))
}

/// Installs a debug-level subscriber appending to `path`. `RUST_LOG` overrides
/// the level when set.
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::info!("Logging to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("debug.log");

        init(&path).unwrap();
        tracing::info!("hello from the test");

        assert!(path.exists());
        assert!(init(&path).is_err(), "a second subscriber is refused");
    }
}
