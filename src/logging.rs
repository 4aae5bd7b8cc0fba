//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The JSON fields that are never written to the logs.
const REDACTED_FIELDS: [&str; 1] = ["password"];

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in JSON request bodies are replaced with asterisks.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return Error::BadRequest("could not read the request body".to_owned()).into_response();
        }
    };

    tracing::info!("Received request: {} {}", parts.method, parts.uri);
    log_body("request", &request_body_for_log(&body_bytes));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    tracing::info!("Sending response: {}", parts.status);
    log_body("response", &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

/// The request body as it should appear in the logs.
///
/// The content type header is not trusted, any body that parses as a JSON
/// object has its [REDACTED_FIELDS] replaced.
fn request_body_for_log(body_bytes: &[u8]) -> String {
    redact_json_fields(&String::from_utf8_lossy(body_bytes))
}

/// Replace the values of [REDACTED_FIELDS] in a JSON object with asterisks.
///
/// Text that is not a JSON object is returned unchanged.
fn redact_json_fields(body_text: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    let mut is_redacted = false;
    for field in REDACTED_FIELDS {
        if let Some(value) = object.get_mut(field) {
            *value = Value::String("********".to_owned());
            is_redacted = true;
        }
    }

    if is_redacted {
        Value::Object(object).to_string()
    } else {
        body_text.to_owned()
    }
}

fn log_body(kind: &str, body: &str) {
    match body.char_indices().nth(LOG_BODY_LENGTH_LIMIT) {
        Some((cutoff, _)) => {
            tracing::info!("{kind} body: {}...", &body[..cutoff]);
            tracing::debug!("Full {kind} body: {body:?}");
        }
        None => tracing::info!("{kind} body: {body:?}"),
    }
}
