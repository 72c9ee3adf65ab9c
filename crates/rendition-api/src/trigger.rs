//! Push-notification decoding.
//!
//! A trigger arrives as `{"message": {"data": "<base64>"}}`, where the base64 payload is the
//! storage notification JSON and its `name` field is the raw object id.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rendition_core::{AppError, SourceId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PushEnvelope {
    pub message: Option<PushMessage>,
}

#[derive(Debug, Deserialize)]
pub struct PushMessage {
    pub data: Option<String>,
    #[serde(rename = "messageId", alias = "message_id")]
    pub message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectNotification {
    name: Option<String>,
}

/// Decode a raw request body into the source object id it names.
///
/// Every failure is a `BadTrigger`, so the orchestrator is never invoked for it.
pub fn decode_trigger(body: &[u8]) -> Result<SourceId, AppError> {
    let envelope: PushEnvelope = serde_json::from_slice(body)
        .map_err(|e| AppError::BadTrigger(format!("invalid push envelope: {}", e)))?;

    let message = envelope
        .message
        .ok_or_else(|| AppError::BadTrigger("missing message".to_string()))?;

    let data = message
        .data
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::BadTrigger("missing message data".to_string()))?;

    let payload = STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::BadTrigger(format!("message data is not base64: {}", e)))?;

    let notification: ObjectNotification = serde_json::from_slice(&payload)
        .map_err(|e| AppError::BadTrigger(format!("invalid notification payload: {}", e)))?;

    let name = notification
        .name
        .ok_or_else(|| AppError::BadTrigger("missing object name".to_string()))?;

    let source_id = SourceId::parse(name)?;

    tracing::debug!(
        source_id = %source_id,
        message_id = ?message.message_id,
        "Decoded push trigger"
    );

    Ok(source_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope_for(payload: &serde_json::Value) -> Vec<u8> {
        let data = STANDARD.encode(payload.to_string());
        json!({ "message": { "data": data, "messageId": "1" } })
            .to_string()
            .into_bytes()
    }

    fn assert_bad_trigger(result: Result<SourceId, AppError>) {
        match result {
            Err(AppError::BadTrigger(_)) => {}
            other => panic!("expected BadTrigger, got {:?}", other),
        }
    }

    #[test]
    fn test_decodes_object_name() {
        let body = envelope_for(&json!({ "name": "clip1.mp4", "bucket": "raw-videos" }));
        let source_id = decode_trigger(&body).unwrap();
        assert_eq!(source_id.as_str(), "clip1.mp4");
    }

    #[test]
    fn test_rejects_non_json_body() {
        assert_bad_trigger(decode_trigger(b"not json"));
    }

    #[test]
    fn test_rejects_missing_message() {
        assert_bad_trigger(decode_trigger(br#"{"subscription":"x"}"#));
    }

    #[test]
    fn test_rejects_missing_or_empty_data() {
        assert_bad_trigger(decode_trigger(br#"{"message":{}}"#));
        assert_bad_trigger(decode_trigger(br#"{"message":{"data":""}}"#));
    }

    #[test]
    fn test_rejects_invalid_base64() {
        assert_bad_trigger(decode_trigger(br#"{"message":{"data":"!!!not-base64!!!"}}"#));
    }

    #[test]
    fn test_rejects_payload_without_name() {
        let body = envelope_for(&json!({ "bucket": "raw-videos" }));
        assert_bad_trigger(decode_trigger(&body));
    }

    #[test]
    fn test_rejects_empty_and_path_like_names() {
        assert_bad_trigger(decode_trigger(&envelope_for(&json!({ "name": "" }))));
        assert_bad_trigger(decode_trigger(&envelope_for(&json!({ "name": "   " }))));
        assert_bad_trigger(decode_trigger(&envelope_for(
            &json!({ "name": "../etc/passwd" }),
        )));
    }
}
