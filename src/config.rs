use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use config::{Config, File};
use directories::ProjectDirs;
use std::fs;
use std::io::Write;

use crate::types::AppConfig;

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "lxcdash", "lxcdash")
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = project_dirs().context("Failed to determine project directories")?;
    let config_dir = proj_dirs.config_dir();

    if !config_dir.exists() {
        fs::create_dir_all(config_dir)?;
    }

    Ok(config_dir.join("config.toml"))
}

pub fn load_config() -> Result<AppConfig> {
    let config_path = get_config_path()?;
    load_config_from(&config_path)
}

/// Reads `path`, writing the defaults there first if it does not exist yet.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let default_config = AppConfig::default();
        save_config_to(&default_config, path)?;
        return Ok(default_config);
    }

    let settings = Config::builder()
        .add_source(File::from(path.to_path_buf()))
        .build()?;

    let config = settings
        .try_deserialize::<AppConfig>()
        .context("Failed to parse configuration")?;
    Ok(sanitize(config))
}

/// Replaces zero durations, which would spin the poller or the input loop.
pub fn sanitize(mut config: AppConfig) -> AppConfig {
    let defaults = AppConfig::default();
    let fields = [
        ("poll_interval_secs", &mut config.poll_interval_secs, defaults.poll_interval_secs),
        (
            "operation_timeout_secs",
            &mut config.operation_timeout_secs,
            defaults.operation_timeout_secs,
        ),
        ("spinner_interval_ms", &mut config.spinner_interval_ms, defaults.spinner_interval_ms),
        ("input_poll_ms", &mut config.input_poll_ms, defaults.input_poll_ms),
    ];
    for (name, value, default) in fields {
        if *value == 0 {
            tracing::warn!("{} must be positive, using {}", name, default);
            *value = default;
        }
    }
    config
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    let toml_string = toml::to_string_pretty(config)?;

    let mut file = fs::File::create(path)?;
    file.write_all(toml_string.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.poll_interval_secs, AppConfig::default().poll_interval_secs);
        assert!(path.exists());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("operation_timeout_secs = 15"));
    }

    #[test]
    fn partial_file_keeps_defaults_for_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "poll_interval_secs = 20\nshow_stopped = true\n\n[[bindings]]\nkey = \"S\"\naction = \"stop\"\n",
        )
        .unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.poll_interval_secs, 20);
        assert!(loaded.show_stopped);
        assert_eq!(loaded.input_poll_ms, 50);
        assert_eq!(loaded.bindings.len(), 1);
        assert_eq!(loaded.bindings[0].key, 'S');
        assert_eq!(loaded.bindings[0].description, None);
    }

    #[test]
    fn malformed_values_are_reported_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "poll_interval_secs = \"soon\"\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse configuration");
    }

    #[test]
    fn zero_intervals_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "poll_interval_secs = 0\ninput_poll_ms = 0\nmessage_timeout_secs = 0\n",
        )
        .unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.poll_interval_secs, 10);
        assert_eq!(loaded.input_poll_ms, 50);
        assert_eq!(loaded.message_timeout_secs, 0, "an instantly expiring message is allowed");
    }
}
