//! Gemini Live wire format
//!
//! Client and server messages for the `BidiGenerateContent` websocket. Every
//! frame is one JSON object keyed by its message kind.

use super::error::LiveError;
use super::state_machine::SessionEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MIME type of every frame pushed to the session
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

// ============================================================================
// Client -> server
// ============================================================================

/// Message sent to the remote session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(SetupPayload),
    RealtimeInput(RealtimeInput),
    ToolResponse(ToolResponse),
}

impl ClientMessage {
    /// Realtime media input carrying one base64 JPEG frame
    pub fn jpeg_frame(data: String) -> Self {
        ClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![MediaChunk {
                mime_type: JPEG_MIME_TYPE.to_string(),
                data,
            }],
        })
    }

    pub fn tool_response(response: FunctionResponse) -> Self {
        ClientMessage::ToolResponse(ToolResponse {
            function_responses: vec![response],
        })
    }

    pub fn to_json(&self) -> Result<String, LiveError> {
        serde_json::to_string(self)
            .map_err(|e| LiveError::protocol(format!("Failed to serialize message: {e}")))
    }
}

/// Session configuration, sent once as the first frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPayload {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub system_instruction: Content,
    pub tools: Vec<ToolDeclarations>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
}

/// Response modality requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Audio,
    #[allow(dead_code)] // API completeness
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<TextPart>,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDeclarations {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Callable function declared to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub function_responses: Vec<FunctionResponse>,
}

/// Acknowledgement of one function call, matched by `id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionResponse {
    pub id: String,
    pub name: String,
    pub response: Value,
}

// ============================================================================
// Server -> client
// ============================================================================

/// Message received from the remote session. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default)]
    pub setup_complete: Option<Value>,
    #[serde(default)]
    pub tool_call: Option<ToolCallPayload>,
    #[serde(default)]
    pub tool_call_cancellation: Option<ToolCallCancellation>,
    #[serde(default)]
    pub go_away: Option<GoAway>,
    #[serde(default)]
    pub server_content: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPayload {
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
}

/// One model-initiated function invocation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolCallCancellation {
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoAway {
    #[serde(default)]
    pub time_left: Option<String>,
}

impl ServerMessage {
    pub fn parse(raw: &str) -> Result<Self, LiveError> {
        serde_json::from_str(raw)
            .map_err(|e| LiveError::protocol(format!("Failed to parse server message: {e}")))
    }

    /// Session events carried by this message, in wire order.
    ///
    /// Model content (audio, transcripts) is not consumed and yields nothing.
    pub fn into_events(self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.setup_complete.is_some() {
            events.push(SessionEvent::Opened);
        }
        if let Some(tool_call) = self.tool_call {
            if !tool_call.function_calls.is_empty() {
                events.push(SessionEvent::ToolCall {
                    calls: tool_call.function_calls,
                });
            }
        }
        if let Some(cancellation) = self.tool_call_cancellation {
            events.push(SessionEvent::ToolCallCancelled {
                ids: cancellation.ids,
            });
        }
        if let Some(go_away) = self.go_away {
            events.push(SessionEvent::GoAway {
                time_left: go_away.time_left,
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_message_shape() {
        let msg = ClientMessage::jpeg_frame("abcd".to_string());
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "realtimeInput": {
                    "mediaChunks": [{ "mimeType": "image/jpeg", "data": "abcd" }]
                }
            })
        );
    }

    #[test]
    fn test_tool_response_shape() {
        let msg = ClientMessage::tool_response(FunctionResponse {
            id: "call-1".to_string(),
            name: "setHandGesture".to_string(),
            response: json!({ "result": "ok" }),
        });
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "toolResponse": {
                    "functionResponses": [{
                        "id": "call-1",
                        "name": "setHandGesture",
                        "response": { "result": "ok" }
                    }]
                }
            })
        );
    }

    #[test]
    fn test_setup_complete_opens() {
        let events = ServerMessage::parse(r#"{"setupComplete":{}}"#)
            .unwrap()
            .into_events();
        assert!(matches!(events.as_slice(), [SessionEvent::Opened]));
    }

    #[test]
    fn test_tool_call_keeps_wire_order() {
        let raw = json!({
            "toolCall": {
                "functionCalls": [
                    { "id": "a", "name": "setHandGesture", "args": { "gesture": "OPEN" } },
                    { "id": "b", "name": "setHandGesture", "args": { "gesture": "CLOSED" } }
                ]
            }
        })
        .to_string();
        let events = ServerMessage::parse(&raw).unwrap().into_events();
        match events.as_slice() {
            [SessionEvent::ToolCall { calls }] => {
                let ids: Vec<_> = calls.iter().map(|c| c.id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_server_content_yields_nothing() {
        let raw = r#"{"serverContent":{"modelTurn":{"parts":[]}},"usageMetadata":{}}"#;
        assert!(ServerMessage::parse(raw).unwrap().into_events().is_empty());
    }

    #[test]
    fn test_cancellation_and_go_away() {
        let raw = r#"{"toolCallCancellation":{"ids":["x"]},"goAway":{"timeLeft":"10s"}}"#;
        let events = ServerMessage::parse(raw).unwrap().into_events();
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::ToolCallCancelled { .. }, SessionEvent::GoAway { .. }]
        ));
    }

    #[test]
    fn test_garbage_is_protocol_error() {
        let err = ServerMessage::parse("not json").unwrap_err();
        assert_eq!(err.kind, super::super::error::LiveErrorKind::Protocol);
    }
}
