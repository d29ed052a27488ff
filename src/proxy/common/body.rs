// Inbound body -> outbound body

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header, HeaderMap, Method},
};
use bytes::Bytes;

use crate::error::RelayError;

/// One decoded multipart field
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Body to send upstream
#[derive(Debug, Clone)]
pub enum OutboundBody {
    Empty,
    /// Re-serialized JSON document
    Json(Bytes),
    /// Parsed form fields, re-encoded by the client with a fresh boundary
    Multipart(Vec<FormPart>),
    Raw(Bytes),
}

impl OutboundBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, OutboundBody::Multipart(_))
    }
}

/// Only these methods carry a body upstream
pub fn method_carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Decode the inbound body according to method and `Content-Type`
pub async fn read_outbound_body(
    request: Request,
    max_body_size: usize,
) -> Result<OutboundBody, RelayError> {
    if !method_carries_body(request.method()) {
        return Ok(OutboundBody::Empty);
    }

    let content_type = content_type(request.headers());

    if content_type.contains("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| RelayError::InvalidBody(e.body_text()))?;
        return read_multipart(multipart).await.map(OutboundBody::Multipart);
    }

    let raw = axum::body::to_bytes(request.into_body(), max_body_size)
        .await
        .map_err(|e| RelayError::InvalidBody(format!("Failed to read request body: {}", e)))?;

    if content_type.contains("application/json") {
        if raw.is_empty() {
            return Ok(OutboundBody::Empty);
        }
        return reserialize_json(&raw).map(OutboundBody::Json);
    }

    Ok(OutboundBody::Raw(raw))
}

/// Parse then re-serialize, so malformed documents never reach upstream
pub fn reserialize_json(raw: &[u8]) -> Result<Bytes, RelayError> {
    let value: serde_json::Value = serde_json::from_slice(raw)
        .map_err(|e| RelayError::InvalidBody(format!("Malformed JSON: {}", e)))?;
    serde_json::to_vec(&value)
        .map(Bytes::from)
        .map_err(|e| RelayError::InvalidBody(format!("Malformed JSON: {}", e)))
}

async fn read_multipart(mut multipart: Multipart) -> Result<Vec<FormPart>, RelayError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::InvalidBody(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| RelayError::InvalidBody(e.body_text()))?;

        parts.push(FormPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    Ok(parts)
}

/// Rebuild a client-side form from parsed fields
pub fn build_form(parts: Vec<FormPart>) -> Result<reqwest::multipart::Form, RelayError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        let mut outbound = reqwest::multipart::Part::bytes(part.data.to_vec());
        if let Some(file_name) = part.file_name {
            outbound = outbound.file_name(file_name);
        }
        if let Some(mime) = part.content_type {
            outbound = outbound
                .mime_str(&mime)
                .map_err(|e| RelayError::InvalidBody(format!("Invalid part content type: {}", e)))?;
        }
        form = form.part(part.name, outbound);
    }
    Ok(form)
}
