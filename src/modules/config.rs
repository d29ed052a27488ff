use std::fs;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};
use crate::models::AppConfig;

const DATA_DIR: &str = ".api_relay";
const CONFIG_FILE: &str = "relay_config.json";

/// Get data directory path, creating it when missing
///
/// `RELAY_DATA_DIR` overrides `~/.api_relay`.
pub fn get_data_dir() -> AppResult<PathBuf> {
    let data_dir = match std::env::var_os("RELAY_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?
            .join(DATA_DIR),
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

fn config_path() -> AppResult<PathBuf> {
    match std::env::var_os("RELAY_CONFIG") {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(get_data_dir()?.join(CONFIG_FILE)),
    }
}

/// Load application config: file (if any), then environment overrides
pub fn load_app_config() -> AppResult<AppConfig> {
    let config_path = config_path()?;

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::Config(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })?
    } else {
        AppConfig::new()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Save application config
pub fn save_app_config(config: &AppConfig) -> AppResult<()> {
    let config_path = config_path()?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, content)?;
    Ok(())
}

/// Overlay `RELAY_*` variables read through `lookup`
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let proxy = &mut config.proxy;

    if let Some(url) = lookup("RELAY_UPSTREAM_URL") {
        proxy.upstream_url = url;
    }
    if let Some(path) = lookup("RELAY_MOUNT_PATH") {
        proxy.mount_path = path;
    }
    if let Some(port) = lookup("RELAY_PORT") {
        proxy.port = parse_var("RELAY_PORT", &port)?;
    }
    if let Some(timeout) = lookup("RELAY_REQUEST_TIMEOUT") {
        proxy.request_timeout = parse_var("RELAY_REQUEST_TIMEOUT", &timeout)?;
    }
    if let Some(lan) = lookup("RELAY_ALLOW_LAN") {
        proxy.allow_lan_access = matches!(lan.trim(), "1" | "true" | "yes");
    }
    Ok(())
}

fn parse_var<T>(key: &str, value: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}={}: {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_applied() {
        let vars = env(&[
            ("RELAY_UPSTREAM_URL", "https://axum.example.com/"),
            ("RELAY_PORT", "8045"),
            ("RELAY_MOUNT_PATH", "/relay"),
            ("RELAY_REQUEST_TIMEOUT", " 15 "),
            ("RELAY_ALLOW_LAN", "true"),
        ]);
        let mut config = AppConfig::new();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.proxy.upstream_url, "https://axum.example.com/");
        assert_eq!(config.proxy.port, 8045);
        assert_eq!(config.proxy.mount_path, "/relay");
        assert_eq!(config.proxy.request_timeout, 15);
        assert!(config.proxy.allow_lan_access);
    }

    #[test]
    fn test_no_env_keeps_file_values() {
        let mut config: AppConfig = serde_json::from_str(
            r#"{"proxy": {"upstream_url": "http://10.0.0.5:8080", "port": 4000}}"#,
        )
        .unwrap();
        apply_env_overrides(&mut config, |_| None).unwrap();

        assert_eq!(config.proxy.upstream_url, "http://10.0.0.5:8080");
        assert_eq!(config.proxy.port, 4000);
        assert!(config.file_logging);
    }

    #[test]
    fn test_bad_port_is_config_error() {
        let vars = env(&[("RELAY_PORT", "eighty")]);
        let mut config = AppConfig::new();
        let err = apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("RELAY_PORT"));
    }
}
