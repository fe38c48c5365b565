//! Mock implementations for testing
//!
//! These mocks let the session manager run end to end without a websocket or
//! a camera.

use super::error::LiveError;
use super::protocol::{ClientMessage, FunctionResponse};
use super::setup::SessionSetup;
use super::state_machine::SessionEvent;
use super::transport::{LiveConnection, LiveConnector, LiveLink, EVENT_BUFFER};
use crate::video::VideoSource;
use async_trait::async_trait;
use image::RgbImage;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};

// ============================================================================
// Mock Link
// ============================================================================

/// Link that records every message sent while open
#[derive(Default)]
pub struct MockLink {
    sent: Mutex<Vec<ClientMessage>>,
    closed: Mutex<bool>,
    close_calls: AtomicUsize,
    /// Sends recorded at the moment of the first close
    sent_at_close: Mutex<Option<usize>>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn sent_at_close(&self) -> Option<usize> {
        *self.sent_at_close.lock().unwrap()
    }

    /// Tool responses sent so far, in order
    pub fn tool_responses(&self) -> Vec<FunctionResponse> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                ClientMessage::ToolResponse(r) => Some(r.function_responses),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn frames_sent(&self) -> usize {
        self.sent()
            .iter()
            .filter(|m| matches!(m, ClientMessage::RealtimeInput(_)))
            .count()
    }
}

#[async_trait]
impl LiveLink for MockLink {
    async fn send(&self, message: ClientMessage) -> Result<(), LiveError> {
        if self.is_closed() {
            return Err(LiveError::closed("Mock link closed"));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn close(&self) -> Result<(), LiveError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        let mut closed = self.closed.lock().unwrap();
        if !*closed {
            *closed = true;
            *self.sent_at_close.lock().unwrap() = Some(self.sent.lock().unwrap().len());
        }
        Ok(())
    }
}

// ============================================================================
// Mock Connector
// ============================================================================

/// Test-side handle to a queued mock session
pub struct MockSession {
    pub link: Arc<MockLink>,
    /// Inject inbound events as if they came off the wire
    pub events: mpsc::Sender<SessionEvent>,
}

impl MockSession {
    pub async fn push(&self, event: SessionEvent) {
        self.events.send(event).await.unwrap();
    }
}

type QueuedConnect = Result<(Arc<MockLink>, mpsc::Receiver<SessionEvent>), LiveError>;

/// Connector that hands out queued sessions
#[derive(Default)]
pub struct MockConnector {
    queued: Mutex<VecDeque<QueuedConnect>>,
    /// Record of every setup passed to `connect`
    pub setups: Mutex<Vec<SessionSetup>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a session that opens successfully
    pub fn queue_session(&self) -> MockSession {
        let link = Arc::new(MockLink::new());
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.queued
            .lock()
            .unwrap()
            .push_back(Ok((Arc::clone(&link), rx)));
        MockSession { link, events: tx }
    }

    /// Queue a failed handshake
    pub fn queue_error(&self, error: LiveError) {
        self.queued.lock().unwrap().push_back(Err(error));
    }

    pub fn connect_count(&self) -> usize {
        self.setups.lock().unwrap().len()
    }
}

#[async_trait]
impl LiveConnector for MockConnector {
    async fn connect(&self, setup: &SessionSetup) -> Result<LiveConnection, LiveError> {
        self.setups.lock().unwrap().push(setup.clone());
        let (link, events) = self
            .queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LiveError::transport("No mock session queued")))?;
        Ok(LiveConnection { link, events })
    }
}

/// Connector whose handshakes wait until released, one per `release`.
/// Never released, it behaves like a peer that never answers.
pub struct GatedConnector {
    pub inner: MockConnector,
    gate: Semaphore,
    started: AtomicUsize,
}

impl GatedConnector {
    pub fn new() -> Self {
        Self {
            inner: MockConnector::new(),
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Handshakes that have begun waiting
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveConnector for GatedConnector {
    async fn connect(&self, setup: &SessionSetup) -> Result<LiveConnection, LiveError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| LiveError::closed("Gate closed"))?;
        permit.forget();
        self.inner.connect(setup).await
    }
}

// ============================================================================
// Static Video Source
// ============================================================================

/// Video source that always returns the same frame (or none)
pub struct StaticVideoSource {
    frame: Option<RgbImage>,
    snapshots: AtomicUsize,
}

impl StaticVideoSource {
    pub fn new(frame: Option<RgbImage>) -> Self {
        Self {
            frame,
            snapshots: AtomicUsize::new(0),
        }
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

impl VideoSource for StaticVideoSource {
    fn snapshot(&self) -> Option<RgbImage> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        self.frame.clone()
    }
}
