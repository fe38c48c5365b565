//! Pure state transition function

use super::{Effect, SessionEvent, SessionState};
use crate::live::protocol::FunctionCall;
use crate::live::tool::{reject_unknown, HandGestureTool, SET_HAND_GESTURE};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A live session is already active")]
    AlreadyActive,
}

/// Pure transition function.
///
/// Given the same state and event it always produces the same result and
/// performs no I/O.
pub fn transition(
    state: &SessionState,
    event: SessionEvent,
) -> Result<TransitionResult, TransitionError> {
    match (*state, event) {
        // ============================================================
        // Connect
        // ============================================================
        (SessionState::Disconnected, SessionEvent::ConnectRequested) => {
            Ok(TransitionResult::new(SessionState::Connecting))
        }

        (SessionState::Connecting | SessionState::Connected, SessionEvent::ConnectRequested) => {
            Err(TransitionError::AlreadyActive)
        }

        (SessionState::Connecting, SessionEvent::Opened) => {
            Ok(TransitionResult::new(SessionState::Connected)
                .with_effect(Effect::status(true))
                .with_effect(Effect::StartFrameStream))
        }

        // Repeated setup acknowledgement, or one that lost the race with teardown
        (state @ (SessionState::Connected | SessionState::Disconnected), SessionEvent::Opened) => {
            Ok(TransitionResult::new(state))
        }

        // ============================================================
        // Tool calls: every call answered exactly once, in wire order
        // ============================================================
        (state @ (SessionState::Connecting | SessionState::Connected), SessionEvent::ToolCall { calls }) => {
            Ok(TransitionResult::new(state).with_effects(tool_call_effects(&calls)))
        }

        // No session left to answer on
        (SessionState::Disconnected, SessionEvent::ToolCall { .. }) => {
            Ok(TransitionResult::new(SessionState::Disconnected))
        }

        // Cancelled calls were already answered when they arrived
        (state, SessionEvent::ToolCallCancelled { .. } | SessionEvent::GoAway { .. }) => {
            Ok(TransitionResult::new(state))
        }

        // ============================================================
        // Teardown
        // ============================================================
        (
            SessionState::Connecting | SessionState::Connected,
            SessionEvent::Closed { .. } | SessionEvent::TransportError { .. },
        ) => Ok(TransitionResult::new(SessionState::Disconnected)
            .with_effect(Effect::status(false))
            .with_effect(Effect::StopFrameStream)
            .with_effect(Effect::ReleaseHandle)),

        // Close that follows a local disconnect
        (
            SessionState::Disconnected,
            SessionEvent::Closed { .. } | SessionEvent::TransportError { .. },
        ) => Ok(TransitionResult::new(SessionState::Disconnected)),

        // Safe from any state, any number of times
        (_, SessionEvent::DisconnectRequested) => {
            Ok(TransitionResult::new(SessionState::Disconnected)
                .with_effect(Effect::StopFrameStream)
                .with_effect(Effect::CloseSession)
                .with_effect(Effect::ReleaseHandle)
                .with_effect(Effect::status(false)))
        }
    }
}

fn tool_call_effects(calls: &[FunctionCall]) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(calls.len() * 2);
    for call in calls {
        if call.name == SET_HAND_GESTURE {
            effects.push(Effect::gesture(HandGestureTool::decode(&call.args)));
            effects.push(Effect::respond(HandGestureTool::acknowledge(call)));
        } else {
            effects.push(Effect::respond(reject_unknown(call)));
        }
    }
    effects
}
