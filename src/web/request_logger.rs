use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use uuid::Uuid;

use crate::utils::sanitize::sanitize_json;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_BODY_LOG_SIZE: u64 = 1024;

fn body_logging_enabled() -> bool {
    std::env::var("LOG_REQUEST_BODY")
        .ok()
        .and_then(|value| value.parse::<bool>().ok())
        .unwrap_or(false)
}

/// Redacted rendering of a buffered body; login and signup bodies carry
/// passwords.
fn render_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(json) => serde_json::to_string(&sanitize_json(&json))
            .unwrap_or_else(|_| "[invalid json]".to_string()),
        Err(_) => format!("[non-json, {} bytes]", bytes.len()),
    }
}

/// Logs the request body when its size is known and small. Anything else is
/// forwarded untouched; logging never changes which requests get through.
async fn log_with_body(request_id: &str, req: Request) -> Result<Request, Response> {
    let (parts, body) = req.into_parts();
    let small = body
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= MAX_BODY_LOG_SIZE);

    if !small {
        tracing::info!(
            request_id = %request_id,
            method = %parts.method,
            uri = %parts.uri,
            body = "[body omitted, over 1KB]",
            "Incoming request"
        );
        return Ok(Request::from_parts(parts, body));
    }

    let bytes = match axum::body::to_bytes(body, MAX_BODY_LOG_SIZE as usize).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "Failed to read request body");
            return Err((StatusCode::BAD_REQUEST, "Failed to read request body").into_response());
        }
    };

    tracing::info!(
        request_id = %request_id,
        method = %parts.method,
        uri = %parts.uri,
        body_size = bytes.len(),
        body = %render_body(&bytes),
        "Incoming request"
    );
    Ok(Request::from_parts(parts, Body::from(bytes)))
}

/// Tags every exchange with a request id and logs it on the way in and out.
pub async fn request_logger_middleware(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&request_id).ok();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    if let Some(value) = &header_value {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    if body_logging_enabled() {
        req = match log_with_body(&request_id, req).await {
            Ok(req) => req,
            Err(response) => return response,
        };
    } else {
        tracing::info!(request_id = %request_id, method = %method, uri = %uri, "Incoming request");
    }

    let mut response = next.run(req).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Outgoing response"
    );

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
