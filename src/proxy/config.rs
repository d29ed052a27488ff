use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, AppResult};

/// Relay service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Whether LAN access is allowed
    /// - false: localhost only 127.0.0.1 (default)
    /// - true: all interfaces 0.0.0.0
    pub allow_lan_access: bool,

    /// Listen port
    pub port: u16,

    /// Path prefix under which requests are relayed
    pub mount_path: String,

    /// Base URL of the single backend origin
    pub upstream_url: String,

    /// Outbound request timeout (seconds)
    pub request_timeout: u64,

    /// Cookies that may carry a CSRF token, checked in order
    pub csrf_cookie_names: Vec<String>,

    /// Outbound headers that receive the CSRF token
    pub csrf_header_names: Vec<String>,

    /// Rewrite `Origin` to the upstream's own origin on credentialed requests
    pub forward_upstream_origin: bool,

    /// Preflight cache duration (seconds)
    pub cors_max_age: u64,

    /// Inbound body limit (bytes)
    pub max_body_size: usize,

    /// Path probed by the status endpoint
    pub status_probe_path: String,

    /// Outbound proxy configuration
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Outbound proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// Whether enabled
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: 3000,
            mount_path: "/api/proxy".to_string(),
            upstream_url: "http://localhost:8080".to_string(),
            request_timeout: 30,
            csrf_cookie_names: vec![
                "XSRF-TOKEN".to_string(),
                "csrf_token".to_string(),
                "_csrf".to_string(),
            ],
            csrf_header_names: vec!["X-XSRF-TOKEN".to_string(), "X-CSRF-TOKEN".to_string()],
            forward_upstream_origin: true,
            cors_max_age: 86400,
            max_body_size: 100 * 1024 * 1024,
            status_probe_path: "/".to_string(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Get the actual listen address
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }

    /// Mount path without a trailing slash
    pub fn normalized_mount_path(&self) -> String {
        let trimmed = self.mount_path.trim().trim_end_matches('/');
        if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Parsed upstream base URL
    pub fn upstream_origin(&self) -> AppResult<Url> {
        let url = Url::parse(&self.upstream_url)?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AppError::Config(format!(
                    "Unsupported upstream scheme: {}",
                    other
                )))
            }
        }
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(AppError::Config(format!(
                "Upstream URL has no host: {}",
                self.upstream_url
            )));
        }
        Ok(url)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.upstream_origin()?;

        if !self.mount_path.starts_with('/') {
            return Err(AppError::Config(format!(
                "Mount path must start with '/': {}",
                self.mount_path
            )));
        }
        if self.normalized_mount_path().is_empty() {
            return Err(AppError::Config(
                "Mount path cannot be the root path".to_string(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(AppError::Config(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        if !self.csrf_cookie_names.is_empty() && self.csrf_header_names.is_empty() {
            return Err(AppError::Config(
                "CSRF cookies are configured but no CSRF header names are".to_string(),
            ));
        }
        for name in &self.csrf_header_names {
            axum::http::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::Config(format!("Invalid CSRF header {}: {}", name, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ProxyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.get_bind_address(), "127.0.0.1");
        assert_eq!(config.normalized_mount_path(), "/api/proxy");
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: ProxyConfig =
            serde_json::from_str(r#"{"upstream_url": "https://backend.example.com"}"#).unwrap();
        assert_eq!(config.upstream_url, "https://backend.example.com");
        assert_eq!(config.port, 3000);
        assert_eq!(config.csrf_cookie_names.len(), 3);
    }

    #[test]
    fn test_mount_path_normalization() {
        let config = ProxyConfig {
            mount_path: "/relay/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.normalized_mount_path(), "/relay");

        let root = ProxyConfig {
            mount_path: "/".to_string(),
            ..Default::default()
        };
        assert!(root.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_upstream() {
        for upstream in ["not a url", "ftp://files.example.com", "mailto:ops@example.com"] {
            let config = ProxyConfig {
                upstream_url: upstream.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{} should be rejected", upstream);
        }
    }

    #[test]
    fn test_rejects_zero_timeout_and_missing_csrf_headers() {
        let config = ProxyConfig {
            request_timeout: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ProxyConfig {
            csrf_header_names: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lan_bind_address() {
        let config = ProxyConfig {
            allow_lan_access: true,
            ..Default::default()
        };
        assert_eq!(config.get_bind_address(), "0.0.0.0");
    }
}
