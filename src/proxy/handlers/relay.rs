// Relay handler: forward one request upstream and mirror the answer

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::time::Instant;
use tracing::{error, info};

use crate::error::RelayError;
use crate::proxy::common::body::read_outbound_body;
use crate::proxy::common::headers::{forward_request_headers, relay_response_headers};
use crate::proxy::server::AppState;
use crate::proxy::upstream::client::{OutboundRequest, UpstreamClient};

/// Handle GET / POST / PUT / DELETE / PATCH under the mount path
pub async fn handle_relay(State(state): State<AppState>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    match relay(&state, request).await {
        Ok((target, response)) => {
            info!(
                "Relayed {} {} -> {} [{}] in {} ms",
                method,
                path,
                target,
                response.status().as_u16(),
                started.elapsed().as_millis()
            );
            response
        }
        Err(e) => {
            error!("Proxy error on {} {}: {}", method, path, e);
            e.into_response()
        }
    }
}

async fn relay(state: &AppState, request: Request) -> Result<(String, Response), RelayError> {
    let tail = strip_mount(request.uri().path(), &state.mount_path).to_string();
    let target = UpstreamClient::build_target_url(
        state.upstream.base_url(),
        &tail,
        request.uri().query(),
    );

    let method = request.method().clone();
    let mut headers =
        forward_request_headers(request.headers(), &state.config, &state.upstream_origin);

    let body = read_outbound_body(request, state.config.max_body_size).await?;
    if body.is_multipart() {
        // The client writes its own boundary
        headers.remove(header::CONTENT_TYPE);
    }

    let reply = state
        .upstream
        .send(OutboundRequest {
            method,
            url: target.clone(),
            headers,
            body,
        })
        .await?;

    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    *response.headers_mut() = relay_response_headers(&reply.headers);

    Ok((target, response))
}

/// Path remainder after the mount prefix
pub fn strip_mount<'a>(path: &'a str, mount_path: &str) -> &'a str {
    match path.strip_prefix(mount_path) {
        Some(tail) if tail.is_empty() || tail.starts_with('/') => tail,
        _ => path,
    }
}

/// Preflight: answered locally, never reaches upstream
///
/// The CORS middleware adds the rest of the header set.
pub async fn handle_preflight(State(state): State<AppState>) -> Response {
    let mut response = StatusCode::OK.into_response();
    response.headers_mut().insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from(state.config.cors_max_age),
    );
    response
}
