//! JSON frame codec

use thiserror::Error;

use super::messages::{ClientMessage, ServerMessage};
use crate::consts::MAX_LOGGED_FRAME;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode frame {raw:?}: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        /// Leading slice of the offending frame
        raw: String,
    },
}

/// Serialize an outbound message into a single text frame
pub fn encode(message: &ClientMessage) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(CodecError::Encode)
}

/// Parse one inbound text frame
///
/// Fails on non-JSON input, unknown `type` values and missing fields.
pub fn decode(frame: &str) -> Result<ServerMessage, CodecError> {
    serde_json::from_str(frame).map_err(|source| CodecError::Decode {
        source,
        raw: truncate(frame, MAX_LOGGED_FRAME),
    })
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_start_session() {
        let frame = encode(&ClientMessage::StartSession {
            query: "career".to_string(),
        })
        .unwrap();
        assert_eq!(frame, r#"{"type":"start_session","query":"career"}"#);
    }

    #[test]
    fn test_decode_unit_variants() {
        assert_eq!(decode(r#"{"type":"pong"}"#).unwrap(), ServerMessage::Pong);
        assert_eq!(
            decode(r#"{"type":"interpretation_complete"}"#).unwrap(),
            ServerMessage::InterpretationComplete
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("not json"), Err(CodecError::Decode { .. })));
        assert!(decode(r#"{"type":"teleport"}"#).is_err());
        assert!(decode(r#"{"type":"card_selected","card_id":"x"}"#).is_err());
        assert!(decode(r#"{"message":"no tag"}"#).is_err());
    }

    #[test]
    fn test_decode_error_truncates_raw_frame() {
        let long = "x".repeat(1000);
        match decode(&long) {
            Err(CodecError::Decode { raw, .. }) => {
                assert_eq!(raw.len(), MAX_LOGGED_FRAME + 3);
                assert!(raw.ends_with("..."));
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }
}
