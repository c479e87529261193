//! Error mapping for backend-specific APIs
//!
//! Converts error responses from Elasticsearch, Coralogix and Slack into
//! the normalized [`ServiceError`] type.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};

/// Map a status code and message to the matching error category
pub fn map_status(status: StatusCode, message: impl Into<String>) -> ServiceError {
    let message = message.into();
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limit(message),
        StatusCode::NOT_FOUND => ServiceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => ServiceError::unavailable(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ServiceError::validation(message),
        _ => ServiceError::service(message),
    }
}

/// Map an Elasticsearch error body.
///
/// Elasticsearch reports `{"error": {"type": ..., "reason": ...}, "status": N}`.
pub fn map_elasticsearch_error(status: StatusCode, json: &Value, context: &mut ErrorContext) -> ServiceError {
    context.service = "elasticsearch".to_string();

    let error = json.get("error");
    if let Some(error_type) = error.and_then(|e| e.get("type")).and_then(Value::as_str) {
        context.error_code = Some(error_type.to_string());
    }

    let message = error
        .and_then(|e| e.get("reason").or_else(|| e.get("root_cause").and_then(|r| r.get(0)).and_then(|r| r.get("reason"))))
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .unwrap_or("Unknown Elasticsearch error");

    // A missing index means there is nothing to search, not a broken backend.
    if context.error_code.as_deref() == Some("index_not_found_exception") {
        return ServiceError::not_found(message);
    }
    map_status(status, message)
}

/// Map a Coralogix DataPrime API error body
pub fn map_coralogix_error(status: StatusCode, json: &Value, context: &mut ErrorContext) -> ServiceError {
    context.service = "coralogix".to_string();

    if let Some(code) = json.get("code").and_then(Value::as_str) {
        context.error_code = Some(code.to_string());
    }
    let message = json
        .get("message")
        .or_else(|| json.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown Coralogix error");

    map_status(status, message)
}

/// Map a Slack Web API `error` code.
///
/// Slack answers most failures with HTTP 200 and `{"ok": false, "error": code}`.
pub fn map_slack_error(code: &str) -> ServiceError {
    let message = format!("Slack API error: {}", code);
    match code {
        "not_authed" | "invalid_auth" | "account_inactive" | "token_revoked" | "token_expired" => {
            ServiceError::authentication(message)
        }
        "missing_scope" | "not_allowed_token_type" | "not_in_channel" | "is_archived" | "restricted_action" => {
            ServiceError::authorization(message)
        }
        "channel_not_found" => ServiceError::not_found(message),
        "ratelimited" | "rate_limited" => ServiceError::rate_limit(message),
        "service_unavailable" | "fatal_error" | "internal_error" | "request_timeout" => {
            ServiceError::unavailable(message)
        }
        "invalid_arguments" | "invalid_blocks" | "invalid_blocks_format" | "msg_too_long" | "no_text" => {
            ServiceError::validation(message)
        }
        _ => ServiceError::service(message),
    }
    .with_context(ErrorContext::for_service("slack").error_code(code))
}

/// Map a generic HTTP error to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match context.service.as_str() {
            "elasticsearch" => return map_elasticsearch_error(status, &json, context),
            "coralogix" => return map_coralogix_error(status, &json, context),
            _ => {
                let message = json
                    .get("message")
                    .or_else(|| json.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or(body);
                return map_status(status, message);
            }
        }
    }

    let message = if body.is_empty() {
        status.to_string()
    } else if body.len() > 200 {
        format!("{}: {}...", status, crate::util::truncate_string(body, 200))
    } else {
        format!("{}: {}", status, body)
    };
    map_status(status, message)
}

/// Determine if an HTTP status code indicates a retryable error
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 502 | 503 | 504)
}
