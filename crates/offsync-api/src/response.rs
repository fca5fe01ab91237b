// Response unwrapping shared by the record and blob clients.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Error bodies longer than this are cut before landing in an error message.
const MAX_ERROR_BODY: usize = 256;

/// Parse a JSON body, or map a non-success status to an [`Error`].
pub(crate) async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;
    check_status(status, &body)?;

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Consume a response whose body carries no payload of interest.
pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    check_status(status, &body)
}

fn check_status(status: StatusCode, body: &str) -> Result<(), Error> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: error_message(status, body),
            status: Some(status.as_u16()),
        });
    }
    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            message: error_message(status, body),
        });
    }
    Ok(())
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": ...}` and `{"error": ...}` JSON shapes, falling
/// back to the raw text and finally to the status reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(msg) = value.get(field).and_then(serde_json::Value::as_str) {
                return msg.to_owned();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_owned();
    }

    trimmed.chars().take(MAX_ERROR_BODY).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn message_field_wins() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message":"title required"}"#);
        assert_eq!(msg, "title required");
    }

    #[test]
    fn error_field_is_accepted() {
        let msg = error_message(StatusCode::CONFLICT, r#"{"error":"stale write"}"#);
        assert_eq!(msg, "stale write");
    }

    #[test]
    fn empty_body_falls_back_to_reason() {
        let msg = error_message(StatusCode::SERVICE_UNAVAILABLE, "  ");
        assert_eq!(msg, "Service Unavailable");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let msg = error_message(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert_eq!(msg.len(), MAX_ERROR_BODY);
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        let err = check_status(StatusCode::UNAUTHORIZED, "").unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
    }
}
