// Request logging middleware
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Tag each request with an id and log entry and exit
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let existing = request.headers().get(&REQUEST_ID_HEADER).cloned();
    let request_id = match existing {
        Some(id) => id,
        None => {
            let generated = uuid::Uuid::new_v4().simple().to_string();
            // A simple uuid is always a valid header value
            let value = HeaderValue::from_str(&generated)
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            request
                .headers_mut()
                .insert(REQUEST_ID_HEADER, value.clone());
            value
        }
    };
    let id = request_id.to_str().unwrap_or("invalid").to_string();

    let method = request.method().clone();
    let uri = request.uri().clone();
    tracing::info!("Request [{}]: {} {}", id, method, uri);

    let started = Instant::now();
    let mut response = next.run(request).await;

    tracing::info!(
        "Response [{}]: {} {} -> {} ({} ms)",
        id,
        method,
        uri.path(),
        response.status().as_u16(),
        started.elapsed().as_millis()
    );

    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id);
    response
}
