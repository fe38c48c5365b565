//! Effects produced by state transitions

use crate::gesture::GestureSignal;
use crate::live::protocol::FunctionResponse;

/// Effects to be executed, in order, after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Tell subscribers whether the session is connected
    NotifyStatus { connected: bool },

    /// Tell subscribers a new gesture was classified
    NotifyGesture { gesture: GestureSignal },

    /// Acknowledge one function call
    SendToolResponse { response: FunctionResponse },

    /// Begin the fixed-cadence frame upload
    StartFrameStream,

    /// Cancel the frame timer; in-flight encodes are left to the send guard
    StopFrameStream,

    /// Close the transport gracefully and wait for it
    CloseSession,

    /// Drop the session handle so a later connect can succeed
    ReleaseHandle,
}

impl Effect {
    pub fn status(connected: bool) -> Self {
        Effect::NotifyStatus { connected }
    }

    pub fn gesture(gesture: GestureSignal) -> Self {
        Effect::NotifyGesture { gesture }
    }

    pub fn respond(response: FunctionResponse) -> Self {
        Effect::SendToolResponse { response }
    }
}
