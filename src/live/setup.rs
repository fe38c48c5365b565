//! Session setup: model, modalities, tools and system instruction

use super::protocol::{
    ClientMessage, Content, FunctionDeclaration, GenerationConfig, Modality, SetupPayload,
    ToolDeclarations,
};
use super::tool::HandGestureTool;

/// Native-audio live model; audio responses are mandatory for it
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

/// Instruction sent once when the session opens
pub const SYSTEM_INSTRUCTION: &str = "\
You are a real-time vision controller for a particle system.
Continuously analyze the video input.
If you see a user's hand that is OPEN (fingers spread), call setHandGesture(gesture='OPEN').
If you see a user's hand that is CLOSED (fist or pinched), call setHandGesture(gesture='CLOSED').
Be highly responsive. If the hand is out of frame or unclear, default to CLOSED.";

/// Everything sent in the opening `setup` frame
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSetup {
    pub model: String,
    pub response_modalities: Vec<Modality>,
    pub system_instruction: String,
    pub tools: Vec<FunctionDeclaration>,
}

impl SessionSetup {
    /// Gesture-classification session for `model`
    pub fn hand_gesture(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            // Tool calls are all we consume, but the model only speaks audio
            response_modalities: vec![Modality::Audio],
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            tools: vec![HandGestureTool::declaration()],
        }
    }

    /// Model resource name as the endpoint expects it
    pub fn model_resource(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    pub fn to_message(&self) -> ClientMessage {
        ClientMessage::Setup(SetupPayload {
            model: self.model_resource(),
            generation_config: GenerationConfig {
                response_modalities: self.response_modalities.clone(),
            },
            system_instruction: Content::text(self.system_instruction.clone()),
            tools: vec![ToolDeclarations {
                function_declarations: self.tools.clone(),
            }],
        })
    }
}

impl Default for SessionSetup {
    fn default() -> Self {
        Self::hand_gesture(DEFAULT_MODEL)
    }
}
