use reqwest::{redirect, Client, Proxy};

use crate::error::AppResult;
use crate::proxy::config::UpstreamProxyConfig;

/// Create an HTTP client with specified proxy configuration
///
/// Redirects are not followed: the caller receives the upstream 3xx as-is.
/// Compressed bodies are decoded transparently.
pub fn create_client_with_proxy(
    timeout_secs: u64,
    proxy_config: Option<&UpstreamProxyConfig>,
) -> AppResult<Client> {
    let mut builder = Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .redirect(redirect::Policy::none())
        .gzip(true)
        .brotli(true)
        .deflate(true);

    if let Some(config) = proxy_config {
        if config.enabled && !config.url.is_empty() {
            match Proxy::all(&config.url) {
                Ok(proxy) => {
                    builder = builder.proxy(proxy);
                    tracing::info!("HTTP client upstream proxy enabled: {}", config.url);
                }
                Err(e) => {
                    tracing::error!("Invalid proxy address: {}, error: {}", config.url, e);
                }
            }
        }
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_proxy_is_skipped() {
        let config = UpstreamProxyConfig {
            enabled: true,
            url: "::not a proxy::".to_string(),
        };
        assert!(create_client_with_proxy(5, Some(&config)).is_ok());
    }
}
