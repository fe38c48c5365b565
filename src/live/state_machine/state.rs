//! Session lifecycle states

/// Where the single live session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session handle exists
    #[default]
    Disconnected,
    /// Handshake in flight, setup not yet acknowledged
    Connecting,
    /// Setup acknowledged; frames are streaming
    Connected,
}

impl SessionState {
    pub fn is_connected(self) -> bool {
        matches!(self, SessionState::Connected)
    }

    /// A session handle exists (or is being created)
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Connected)
    }
}
