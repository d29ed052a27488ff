use crate::proxy::ProxyConfig;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Also write logs to `<data dir>/logs`
    #[serde(default = "default_file_logging")]
    pub file_logging: bool,
}

fn default_file_logging() -> bool {
    true
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            file_logging: default_file_logging(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
