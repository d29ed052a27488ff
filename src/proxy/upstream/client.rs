// Upstream client implementation
// One pooled client shared by every relayed request

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use reqwest::{Client, Url};
use tokio::time::{Duration, Instant};

use crate::error::{AppResult, RelayError};
use crate::proxy::common::body::{build_form, OutboundBody};
use crate::proxy::config::ProxyConfig;

/// A fully prepared outbound request
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: OutboundBody,
}

/// Upstream answer, body read fully as raw bytes
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Result of a liveness probe
#[derive(Debug)]
pub struct ProbeOutcome {
    pub status: Option<StatusCode>,
    pub elapsed: Duration,
    pub error: Option<String>,
}

pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig) -> AppResult<Self> {
        let http_client = crate::utils::http::create_client_with_proxy(
            config.request_timeout,
            Some(&config.upstream_proxy),
        )?;

        Ok(Self {
            http_client,
            base_url: config.upstream_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the target URL: `<base><tail>?<query>`
    ///
    /// Plain concatenation; only the slash between base and tail is normalized.
    pub fn build_target_url(base: &str, tail: &str, query: Option<&str>) -> String {
        let base = base.trim_end_matches('/');
        let mut url = String::with_capacity(base.len() + tail.len() + 1);
        url.push_str(base);
        if !tail.is_empty() && !tail.starts_with('/') {
            url.push('/');
        }
        url.push_str(tail);

        if let Some(qs) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(qs);
        }
        url
    }

    /// Issue one outbound request and buffer the reply
    pub async fn send(&self, request: OutboundRequest) -> Result<UpstreamReply, RelayError> {
        let url = Url::parse(&request.url)
            .map_err(|e| RelayError::Upstream(format!("Invalid target URL {}: {}", request.url, e)))?;

        let builder = self
            .http_client
            .request(request.method, url)
            .headers(request.headers);

        let builder = match request.body {
            OutboundBody::Empty => builder,
            OutboundBody::Json(bytes) | OutboundBody::Raw(bytes) => builder.body(bytes),
            OutboundBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamReply {
            status,
            headers,
            body,
        })
    }

    /// HEAD the given path with a short deadline
    pub async fn probe(&self, path: &str, timeout: Duration) -> ProbeOutcome {
        let url = Self::build_target_url(&self.base_url, path, None);
        let started = Instant::now();

        let result = self
            .http_client
            .head(&url)
            .timeout(timeout)
            .send()
            .await;

        match result {
            Ok(response) => ProbeOutcome {
                status: Some(response.status()),
                elapsed: started.elapsed(),
                error: None,
            },
            Err(e) => ProbeOutcome {
                status: None,
                elapsed: started.elapsed(),
                error: Some(RelayError::from(e).to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_target_url() {
        let url1 = UpstreamClient::build_target_url("http://backend:8080", "/api/jabatans", None);
        assert_eq!(url1, "http://backend:8080/api/jabatans");

        let url2 = UpstreamClient::build_target_url(
            "http://backend:8080",
            "/api/karyawans",
            Some("page=2&limit=10"),
        );
        assert_eq!(url2, "http://backend:8080/api/karyawans?page=2&limit=10");
    }

    #[test]
    fn test_build_target_url_slashes() {
        assert_eq!(
            UpstreamClient::build_target_url("https://axum.example.com/", "/csrf", None),
            "https://axum.example.com/csrf"
        );
        assert_eq!(
            UpstreamClient::build_target_url("https://axum.example.com/", "kantors", Some("q=a")),
            "https://axum.example.com/kantors?q=a"
        );
        assert_eq!(
            UpstreamClient::build_target_url("https://axum.example.com/v1", "", Some("")),
            "https://axum.example.com/v1"
        );
    }

    #[test]
    fn test_build_target_url_keeps_query_verbatim() {
        let url = UpstreamClient::build_target_url(
            "http://backend",
            "/search",
            Some("name=Budi%20Santoso&tags=a&tags=b"),
        );
        assert_eq!(url, "http://backend/search?name=Budi%20Santoso&tags=a&tags=b");
    }

    #[tokio::test]
    async fn test_invalid_target_url_is_upstream_error() {
        let client = UpstreamClient::new(&ProxyConfig::default()).unwrap();
        let err = client
            .send(OutboundRequest {
                method: Method::GET,
                url: "http://[broken".to_string(),
                headers: HeaderMap::new(),
                body: OutboundBody::Empty,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Upstream(_)));
    }
}
