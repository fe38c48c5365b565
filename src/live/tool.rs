//! The `setHandGesture` tool the model calls on every classification

use super::protocol::{FunctionCall, FunctionDeclaration, FunctionResponse};
use crate::gesture::GestureSignal;
use serde::Deserialize;
use serde_json::{json, Value};

/// Declared function name
pub const SET_HAND_GESTURE: &str = "setHandGesture";

/// Tool that turns the model's classification into a gesture signal
pub struct HandGestureTool;

#[derive(Debug, Default, Deserialize)]
struct HandGestureInput {
    #[serde(default)]
    gesture: Option<String>,
}

impl HandGestureTool {
    pub fn declaration() -> FunctionDeclaration {
        FunctionDeclaration {
            name: SET_HAND_GESTURE.to_string(),
            description: "Updates the application state based on the user's hand gesture seen in the video.".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "gesture": {
                        "type": "STRING",
                        "enum": ["OPEN", "CLOSED"],
                        "description": "OPEN if the hand fingers are spread out or expanding. CLOSED if the hand is a fist or pinching."
                    }
                },
                "required": ["gesture"]
            }),
        }
    }

    /// Decode the call arguments. Anything other than exactly `OPEN` is
    /// treated as closed.
    pub fn decode(args: &Value) -> GestureSignal {
        let input: HandGestureInput = serde_json::from_value(args.clone()).unwrap_or_default();
        match input.gesture.as_deref() {
            Some("OPEN") => GestureSignal::Open,
            _ => GestureSignal::Closed,
        }
    }

    /// Acknowledgement for a handled call
    pub fn acknowledge(call: &FunctionCall) -> FunctionResponse {
        FunctionResponse {
            id: call.id.clone(),
            name: call.name.clone(),
            response: json!({ "result": "ok" }),
        }
    }
}

/// Error acknowledgement for a call to a function we never declared
pub fn reject_unknown(call: &FunctionCall) -> FunctionResponse {
    FunctionResponse {
        id: call.id.clone(),
        name: call.name.clone(),
        response: json!({ "error": format!("unknown function {}", call.name) }),
    }
}
