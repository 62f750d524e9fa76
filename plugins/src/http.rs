//! Shared reqwest plumbing for the embedding and vector database clients.

use std::time::Duration;

use serde_json::Value;
use vecdex_core::api::VectorError;

const BODY_PREVIEW_LIMIT: usize = 512;

pub(crate) fn build_client(timeout_ms: u64) -> Result<reqwest::Client, VectorError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| VectorError::config(format!("failed to build http client: {}", e)))
}

/// Classify a transport-level reqwest failure. Timeouts keep their own
/// variant so callers can tell them apart from remote errors.
pub(crate) fn map_reqwest_error(
    err: reqwest::Error,
    operation: &'static str,
    timeout_ms: u64,
) -> VectorError {
    if err.is_timeout() {
        VectorError::Timeout {
            operation,
            timeout_ms,
        }
    } else if err.is_decode() {
        VectorError::Decode(err.to_string())
    } else {
        VectorError::Transport(format!("{}: {}", operation, err))
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}

/// Pull a human readable message out of an error body.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` and
/// `{"message": ..}`; otherwise returns a preview of the raw body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("error").filter(|v| v.is_string()))
            .or_else(|| value.get("message"))
            .and_then(Value::as_str);
        if let Some(message) = message {
            return message.to_string();
        }
    }
    preview_body(body)
}

/// Read the response body; non-2xx becomes `VectorError::Api`.
pub(crate) async fn read_success_body(
    resp: reqwest::Response,
    operation: &'static str,
    timeout_ms: u64,
) -> Result<String, VectorError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| map_reqwest_error(e, operation, timeout_ms))?;

    if !status.is_success() {
        return Err(VectorError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(body)
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, VectorError> {
    serde_json::from_str::<T>(body).map_err(|e| {
        VectorError::Decode(format!("{} | body={}", e, preview_body(body)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_body_empty() {
        assert_eq!(preview_body("   "), "<empty body>");
    }

    #[test]
    fn test_preview_body_truncates() {
        let body = "a".repeat(BODY_PREVIEW_LIMIT + 10);
        let preview = preview_body(&body);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= BODY_PREVIEW_LIMIT + 3);
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#),
            "Incorrect API key"
        );
        assert_eq!(error_message(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(error_message(r#"{"code":1100,"message":"invalid dim"}"#), "invalid dim");
        assert_eq!(error_message("bad gateway"), "bad gateway");
    }

    #[test]
    fn test_decode_error_includes_preview() {
        let err = decode::<Value>("not json").unwrap_err();
        match err {
            VectorError::Decode(msg) => assert!(msg.contains("body=not json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
