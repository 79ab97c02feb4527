//! Normalizes body-extraction rejections into the `{error, message}` shape.
//!
//! Axum answers malformed or mistyped JSON bodies with plain-text 400/415/422
//! responses. They are rewritten as 422 JSON so the chat page can show them
//! like any other validation failure, and tagged with an `X-Request-Id`.

use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct RejectionBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

fn hint_for(status: StatusCode, msg: &str) -> Option<&'static str> {
    if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        Some("Send the body with `Content-Type: application/json`.")
    } else if msg.contains("missing field") {
        Some("Include every required field, e.g. { \"question\": \"...\" }.")
    } else if msg.contains("invalid type") {
        Some("`question` and `session_id` must be JSON strings.")
    } else if msg.contains("expected") || msg.contains("EOF") {
        Some("The body is not valid JSON.")
    } else {
        None
    }
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(v) = parts
        .headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    let id = format!("req-{nanos}");
    if let Ok(value) = HeaderValue::from_str(&id) {
        parts.headers.insert("X-Request-Id", value);
    }
    id
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    // Only extraction failures are rewritten; everything else passes through.
    if !matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY
    ) {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let req_id = ensure_request_id(&mut parts);
    if is_json(&parts) {
        return Response::from_parts(parts, body);
    }

    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let original = String::from_utf8_lossy(&bytes);
    debug!(%req_id, %status, body = %original.trim(), "request body rejected");

    let body = RejectionBody {
        error: "VALIDATION_ERROR",
        message: original.trim().to_string(),
        hint: hint_for(status, &original),
    };
    let body = match serde_json::to_vec(&body) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.status = StatusCode::UNPROCESSABLE_ENTITY;
    parts.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}
