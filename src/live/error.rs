//! Live session error types

use thiserror::Error;

/// Live session error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LiveError {
    pub kind: LiveErrorKind,
    pub message: String,
}

impl LiveError {
    pub fn new(kind: LiveErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(LiveErrorKind::Transport, message)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(LiveErrorKind::Closed, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(LiveErrorKind::Protocol, message)
    }

    pub fn media(message: impl Into<String>) -> Self {
        Self::new(LiveErrorKind::Media, message)
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::new(LiveErrorKind::Encode, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(LiveErrorKind::Config, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveErrorKind {
    /// Network or websocket failure - ends the session, never retried here
    Transport,
    /// Send attempted on a session that is already gone
    Closed,
    /// Peer sent something we could not understand
    Protocol,
    /// Camera or frame source unavailable - surfaced to the user
    Media,
    /// Frame could not be encoded
    Encode,
    /// Missing or invalid configuration
    Config,
}

impl LiveErrorKind {
    /// Failures that end the session and surface as a disconnected status
    pub fn is_transport(self) -> bool {
        matches!(self, Self::Transport | Self::Closed)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for LiveError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match &e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                LiveError::closed(format!("Websocket closed: {e}"))
            }
            WsError::Protocol(_) => {
                LiveError::protocol(format!("Websocket protocol error: {e}"))
            }
            _ => LiveError::transport(format!("Websocket error: {e}")),
        }
    }
}

impl From<image::ImageError> for LiveError {
    fn from(e: image::ImageError) -> Self {
        LiveError::encode(format!("Frame encoding failed: {e}"))
    }
}
