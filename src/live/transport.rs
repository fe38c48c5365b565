//! Trait abstractions for the live session transport
//!
//! The manager only ever talks to these traits, so tests can drive it with
//! the mocks in `live::testing` instead of a websocket.

use super::error::LiveError;
use super::protocol::ClientMessage;
use super::setup::SessionSetup;
use super::state_machine::SessionEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of the inbound event channel handed back by a connector
pub const EVENT_BUFFER: usize = 64;

/// Outbound half of an open session
#[async_trait]
pub trait LiveLink: Send + Sync {
    /// Send one message. Fails with a `Closed` error once the link is closed.
    async fn send(&self, message: ClientMessage) -> Result<(), LiveError>;

    /// Close the session and wait for the close to go out. Idempotent.
    async fn close(&self) -> Result<(), LiveError>;
}

/// Opens sessions against the remote service
#[async_trait]
pub trait LiveConnector: Send + Sync {
    /// Open a session and send `setup` as its first frame.
    ///
    /// The returned event stream yields `Opened` once the peer accepts the
    /// setup, and ends with `Closed` or `TransportError`.
    async fn connect(&self, setup: &SessionSetup) -> Result<LiveConnection, LiveError>;
}

/// An open session: outbound link plus inbound events in wire order
pub struct LiveConnection {
    pub link: Arc<dyn LiveLink>,
    pub events: mpsc::Receiver<SessionEvent>,
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: LiveLink + ?Sized> LiveLink for Arc<T> {
    async fn send(&self, message: ClientMessage) -> Result<(), LiveError> {
        (**self).send(message).await
    }

    async fn close(&self) -> Result<(), LiveError> {
        (**self).close().await
    }
}

#[async_trait]
impl<T: LiveConnector + ?Sized> LiveConnector for Arc<T> {
    async fn connect(&self, setup: &SessionSetup) -> Result<LiveConnection, LiveError> {
        (**self).connect(setup).await
    }
}
