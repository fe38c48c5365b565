//! Events that drive the session lifecycle

use crate::live::protocol::FunctionCall;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    // Local events
    ConnectRequested,
    DisconnectRequested,

    // Remote events
    /// The peer acknowledged our setup frame
    Opened,
    /// One inbound message worth of function calls, in wire order
    ToolCall {
        calls: Vec<FunctionCall>,
    },
    ToolCallCancelled {
        ids: Vec<String>,
    },
    /// The peer announced it will close the connection soon
    GoAway {
        time_left: Option<String>,
    },

    // Transport events
    Closed {
        reason: Option<String>,
    },
    TransportError {
        message: String,
    },
}
