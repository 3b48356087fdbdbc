//! Wire protocol frames exchanged with the Sola orchestrator.
//!
//! Every frame is a JSON object discriminated by a `type` field. Inbound
//! frames with an unrecognized `type` are ignored so that newer backends
//! can add message kinds without breaking older clients.

use serde::{Deserialize, Serialize};

/// Action carried by an outbound `system` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemAction {
    /// Request Tier-2 consent for privileged commands on this connection.
    Grant,
    /// Withdraw previously granted consent.
    Revoke,
}

/// Frames the client sends to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Free-form chat input; the backend answers with a streamed response.
    Speak {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        project: Option<String>,
    },
    /// Backend-bound command input.
    Command {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        project: Option<String>,
    },
    /// Consent management for privileged commands.
    System { action: SystemAction },
}

/// Frames the orchestrator sends to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Outcome of a consent grant/revoke request.
    SystemResponse { consent_granted: bool },
    /// Legacy whole-text response for backends without chunked streaming.
    SpeakResponse {
        content: String,
        #[serde(default)]
        memory_commit: Option<String>,
    },
    /// One partial-token unit of a streamed response.
    SpeakResponseChunk {
        #[serde(default)]
        chunk: String,
        #[serde(default)]
        done: bool,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        memory_commit: Option<String>,
    },
    /// Result of a backend-routed command.
    CommandResponse { result: String },
    /// Server-initiated message not correlated to any client request.
    ProactiveMessage {
        content: String,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    /// Protocol-level error.
    Error { message: String },
}

/// The `type` discriminators this client understands.
const KNOWN_FRAME_TYPES: &[&str] = &[
    "system_response",
    "speak_response",
    "speak_response_chunk",
    "command_response",
    "proactive_message",
    "error",
];

/// Decodes a raw text frame into a [`ServerFrame`].
///
/// Returns `None` for frames that should be ignored: unknown `type`
/// discriminators (forward compatibility) and malformed payloads. Malformed
/// payloads of a known type are logged at warn level since they indicate a
/// backend bug rather than a version skew.
pub fn decode_server_frame(raw: &str) -> Option<ServerFrame> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!("[Protocol] Dropping non-JSON frame: {}", err);
            return None;
        }
    };

    let frame_type = match value.get("type").and_then(|t| t.as_str()) {
        Some(frame_type) => frame_type.to_string(),
        None => {
            tracing::debug!("[Protocol] Dropping frame without type discriminator");
            return None;
        }
    };

    if !KNOWN_FRAME_TYPES.contains(&frame_type.as_str()) {
        tracing::debug!("[Protocol] Ignoring unrecognized frame type '{}'", frame_type);
        return None;
    }

    match serde_json::from_value(value) {
        Ok(frame) => Some(frame),
        Err(err) => {
            tracing::warn!(
                "[Protocol] Malformed '{}' frame dropped: {}",
                frame_type,
                err
            );
            None
        }
    }
}

/// Outbound half of a connection, as seen by the session layer.
///
/// `send_frame` must return an error instead of panicking when the
/// connection is closed; the caller uses that signal to fall back to HTTP.
pub trait FrameSink: Send + Sync {
    /// Queues a frame for transmission.
    fn send_frame(&self, frame: ClientFrame) -> std::result::Result<(), String>;

    /// Whether the underlying connection is currently open.
    fn is_connected(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_frame_serialization() {
        let frame = ClientFrame::Speak {
            text: "Hello".to_string(),
            project: None,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "speak");
        assert_eq!(json["text"], "Hello");
        assert!(json.get("project").is_none());

        let frame = ClientFrame::System {
            action: SystemAction::Grant,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "system");
        assert_eq!(json["action"], "grant");
    }

    #[test]
    fn test_decode_chunk_frame() {
        let frame = decode_server_frame(
            r#"{"type":"speak_response_chunk","chunk":"Hi ","done":false}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            ServerFrame::SpeakResponseChunk {
                chunk: "Hi ".to_string(),
                done: false,
                error: None,
                memory_commit: None,
            }
        );
    }

    #[test]
    fn test_decode_defaults_missing_chunk_fields() {
        let frame = decode_server_frame(r#"{"type":"speak_response_chunk","done":true}"#).unwrap();
        assert_eq!(
            frame,
            ServerFrame::SpeakResponseChunk {
                chunk: String::new(),
                done: true,
                error: None,
                memory_commit: None,
            }
        );
    }

    #[test]
    fn test_unknown_frame_type_is_ignored() {
        assert!(decode_server_frame(r#"{"type":"telemetry","payload":{}}"#).is_none());
    }

    #[test]
    fn test_malformed_frame_is_ignored() {
        assert!(decode_server_frame(r#"{"type":"error"}"#).is_none());
        assert!(decode_server_frame("not json at all").is_none());
    }

    #[test]
    fn test_decode_proactive_message() {
        let frame = decode_server_frame(
            r#"{"type":"proactive_message","content":"Checking in","reason":"check_in"}"#,
        )
        .unwrap();
        match frame {
            ServerFrame::ProactiveMessage {
                content, reason, ..
            } => {
                assert_eq!(content, "Checking in");
                assert_eq!(reason.as_deref(), Some("check_in"));
            }
            other => panic!("Expected ProactiveMessage, got {:?}", other),
        }
    }
}
