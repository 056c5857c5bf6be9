//! Settings file and data directory resolution

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::AppSettings;

const APP_DIR: &str = "com.flowspace";
const SETTINGS_FILE: &str = "settings.json";

/// Directory holding settings, the local database and logs
pub fn default_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FLOWSPACE_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or_else(|| Error::Config("Could not find app data directory".to_string()))
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

/// Read settings from `data_dir`, falling back to defaults for a missing file
pub fn read_settings(data_dir: &Path) -> Result<AppSettings> {
    let path = settings_path(data_dir);
    if !path.exists() {
        info!("No settings file at {:?}, using defaults", path);
        return Ok(AppSettings::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| Error::File {
        path: path.clone(),
        source,
    })?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))
}

pub fn save_settings(data_dir: &Path, settings: &AppSettings) -> Result<()> {
    fs::create_dir_all(data_dir)
        .map_err(|e| Error::Config(format!("Failed to create data directory: {}", e)))?;

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;

    fs::write(settings_path(data_dir), content)
        .map_err(|e| Error::Config(format!("Failed to write settings: {}", e)))
}

/// Apply `FLOWSPACE_*` environment overrides
pub fn apply_env_overrides(settings: &mut AppSettings, vars: impl Fn(&str) -> Option<String>) {
    if let Some(url) = vars("FLOWSPACE_API_URL") {
        settings.api_base_url = url;
    }
    if let Some(flag) = vars("FLOWSPACE_NOTIFY_UNREAD") {
        match flag.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => settings.notify_on_unread = true,
            "0" | "false" | "no" => settings.notify_on_unread = false,
            other => warn!("Ignoring FLOWSPACE_NOTIFY_UNREAD={}", other),
        }
    }
    settings.api_base_url = settings.api_base_url.trim_end_matches('/').to_string();
}

/// Settings as the shell uses them: file, then environment
pub fn load_settings() -> Result<AppSettings> {
    let data_dir = default_data_dir()?;
    let mut settings = read_settings(&data_dir)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    if settings.data_dir.is_none() {
        settings.data_dir = Some(data_dir);
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_settings(dir.path()).unwrap(), AppSettings::default());
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings {
            api_base_url: "https://pm.example.com".to_string(),
            notify_on_unread: true,
            ..AppSettings::default()
        };
        save_settings(dir.path(), &settings).unwrap();
        assert_eq!(read_settings(dir.path()).unwrap(), settings);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(settings_path(dir.path()), "not json").unwrap();
        assert!(matches!(read_settings(dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FLOWSPACE_API_URL", "https://api.example.com/"),
            ("FLOWSPACE_NOTIFY_UNREAD", "true"),
        ]
        .into_iter()
        .collect();

        let mut settings = AppSettings::default();
        apply_env_overrides(&mut settings, |k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(settings.api_base_url, "https://api.example.com");
        assert!(settings.notify_on_unread);
    }
}
