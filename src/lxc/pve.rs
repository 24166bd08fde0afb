use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const UNKNOWN_HOSTNAME: &str = "Unknown";

pub fn config_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.conf", id))
}

/// Hostname from the first line mentioning `hostname`, or "Unknown".
pub fn parse_hostname(contents: &str) -> String {
    contents
        .lines()
        .find(|line| line.contains("hostname"))
        .and_then(|line| line.split(':').nth(1))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string())
}

/// Every `key: value` line. Values keep any further colons.
pub fn parse_config(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

pub async fn read_hostname(dir: &Path, id: &str) -> String {
    match tokio::fs::read_to_string(config_path(dir, id)).await {
        Ok(contents) => parse_hostname(&contents),
        Err(_) => UNKNOWN_HOSTNAME.to_string(),
    }
}

pub async fn read_container_config(dir: &Path, id: &str) -> BTreeMap<String, String> {
    match tokio::fs::read_to_string(config_path(dir, id)).await {
        Ok(contents) => parse_config(&contents),
        Err(e) => {
            tracing::debug!("No config for container {}: {}", id, e);
            BTreeMap::new()
        }
    }
}
