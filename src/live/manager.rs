//! Live session manager
//!
//! Owns the single session handle. Local requests and remote events both go
//! through the pure `transition` function; this module only executes the
//! effects it returns. Gesture and status changes leave as `SessionNotice`s on
//! one ordered channel.

use super::frames::{FrameSampler, FrameStream, FRAME_INTERVAL};
use super::protocol::ClientMessage;
use super::setup::SessionSetup;
use super::state_machine::{transition, Effect, SessionEvent, SessionState, TransitionError};
use super::transport::{LiveConnector, LiveLink};
use crate::gesture::GestureSignal;
use crate::video::VideoSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use uuid::Uuid;

/// Output of the manager, delivered in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    Gesture(GestureSignal),
    Status { connected: bool },
}

/// Point-in-time view of the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub connected: bool,
    pub streaming: bool,
    /// Most recent classification; kept across disconnects
    pub last_gesture: GestureSignal,
}

struct SessionHandle {
    generation: u64,
    id: Uuid,
    link: Arc<dyn LiveLink>,
    video: Arc<dyn VideoSource>,
    frames: Option<FrameStream>,
}

#[derive(Default)]
struct SessionSlot {
    state: SessionState,
    handle: Option<SessionHandle>,
    /// Bumped per connect attempt so a stale handshake or event pump can
    /// tell it was replaced
    generation: u64,
    last_gesture: GestureSignal,
}

impl SessionSlot {
    fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            connected: self.state.is_connected(),
            streaming: self
                .handle
                .as_ref()
                .and_then(|h| h.frames.as_ref())
                .is_some_and(FrameStream::is_running),
            last_gesture: self.last_gesture,
        }
    }
}

struct Shared {
    slot: Mutex<SessionSlot>,
    notices: mpsc::UnboundedSender<SessionNotice>,
    /// Readable without the slot lock
    status: watch::Sender<SessionStatus>,
    sampler: FrameSampler,
    frame_interval: Duration,
}

/// Manages at most one live session at a time
pub struct LiveSessionManager<C: LiveConnector> {
    connector: C,
    setup: SessionSetup,
    shared: Arc<Shared>,
}

impl<C: LiveConnector> LiveSessionManager<C> {
    /// Create a manager and the receiving end of its notice channel
    pub fn new(
        connector: C,
        setup: SessionSetup,
    ) -> (Self, mpsc::UnboundedReceiver<SessionNotice>) {
        Self::with_frame_interval(connector, setup, FRAME_INTERVAL)
    }

    pub fn with_frame_interval(
        connector: C,
        setup: SessionSetup,
        frame_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Shared {
            slot: Mutex::new(SessionSlot::default()),
            notices: tx,
            status: watch::Sender::new(SessionStatus::default()),
            sampler: FrameSampler::default(),
            frame_interval,
        };
        let manager = Self {
            connector,
            setup,
            shared: Arc::new(shared),
        };
        (manager, rx)
    }

    /// Open a session streaming frames from `video`.
    ///
    /// Does nothing while a session is already active. Handshake failures
    /// surface as a disconnected status notice. The handshake runs without
    /// the slot lock, so `disconnect` can abandon it.
    pub async fn connect(&self, video: Arc<dyn VideoSource>) {
        let attempt = {
            let mut slot = self.shared.slot.lock().await;
            let result = match transition(&slot.state, SessionEvent::ConnectRequested) {
                Ok(result) => result,
                Err(TransitionError::AlreadyActive) => {
                    tracing::debug!(state = ?slot.state, "Connect ignored, session already active");
                    return;
                }
            };
            slot.state = result.new_state;
            for effect in result.effects {
                self.shared.execute_effect(&mut slot, effect).await;
            }
            slot.generation += 1;
            slot.generation
        };

        let outcome = self.connector.connect(&self.setup).await;

        let mut slot = self.shared.slot.lock().await;
        let superseded = slot.generation != attempt || slot.state != SessionState::Connecting;

        match outcome {
            Ok(connection) if superseded => {
                drop(slot);
                tracing::info!(attempt, "Handshake finished after teardown, discarding session");
                if let Err(e) = connection.link.close().await {
                    tracing::debug!(error = %e, "Close of discarded session failed");
                }
            }
            Ok(connection) => {
                let id = Uuid::new_v4();
                slot.handle = Some(SessionHandle {
                    generation: attempt,
                    id,
                    link: connection.link,
                    video,
                    frames: None,
                });
                tracing::info!(session = %id, model = %self.setup.model, "Live session handshake sent");
                tokio::spawn(pump_events(
                    Arc::clone(&self.shared),
                    attempt,
                    connection.events,
                ));
            }
            Err(e) if superseded => {
                tracing::debug!(attempt, error = %e, "Abandoned handshake failed");
            }
            Err(e) => {
                if e.kind.is_transport() {
                    tracing::warn!(error = %e, "Failed to open live session");
                } else {
                    tracing::error!(error = %e, kind = ?e.kind, "Failed to open live session");
                }
                self.shared
                    .apply(&mut slot, SessionEvent::TransportError { message: e.message })
                    .await;
            }
        }
    }

    /// Close the session if there is one. Safe to call at any time, any
    /// number of times; always ends disconnected.
    pub async fn disconnect(&self) {
        let mut slot = self.shared.slot.lock().await;
        self.shared
            .apply(&mut slot, SessionEvent::DisconnectRequested)
            .await;
    }

    /// Latest published status. Never waits on the session.
    pub fn status(&self) -> SessionStatus {
        *self.shared.status.borrow()
    }
}

impl Shared {
    async fn apply(&self, slot: &mut SessionSlot, event: SessionEvent) {
        match &event {
            SessionEvent::ToolCallCancelled { ids } => {
                tracing::info!(ids = ?ids, "Server cancelled tool calls");
            }
            SessionEvent::GoAway { time_left } => {
                tracing::warn!(time_left = ?time_left, "Server will close the session soon");
            }
            SessionEvent::Closed { reason } if slot.state.is_active() => {
                tracing::info!(reason = ?reason, "Live session closed by server");
            }
            SessionEvent::TransportError { message } if slot.state.is_active() => {
                tracing::warn!(error = %message, "Live session transport error");
            }
            _ => {}
        }

        match transition(&slot.state, event) {
            Ok(result) => {
                slot.state = result.new_state;
                for effect in result.effects {
                    self.execute_effect(slot, effect).await;
                }
            }
            Err(e) => tracing::debug!(error = %e, "Event rejected"),
        }
    }

    async fn execute_effect(&self, slot: &mut SessionSlot, effect: Effect) {
        match effect {
            Effect::NotifyStatus { connected } => {
                tracing::info!(connected, "Live session status changed");
                self.publish(slot);
                self.notify(SessionNotice::Status { connected });
            }

            Effect::NotifyGesture { gesture } => {
                tracing::info!(gesture = %gesture, "Gesture received");
                slot.last_gesture = gesture;
                self.publish(slot);
                self.notify(SessionNotice::Gesture(gesture));
            }

            Effect::SendToolResponse { response } => {
                let Some(handle) = &slot.handle else {
                    return;
                };
                let call_id = response.id.clone();
                if let Err(e) = handle.link.send(ClientMessage::tool_response(response)).await {
                    tracing::warn!(session = %handle.id, call_id = %call_id, error = %e, "Failed to acknowledge tool call");
                } else {
                    tracing::debug!(session = %handle.id, call_id = %call_id, "Tool call acknowledged");
                }
            }

            Effect::StartFrameStream => {
                if let Some(handle) = slot.handle.as_mut() {
                    tracing::info!(session = %handle.id, interval_ms = %self.frame_interval.as_millis(), "Frame streaming started");
                    handle.frames = Some(FrameStream::spawn(
                        Arc::clone(&handle.video),
                        Arc::clone(&handle.link),
                        self.sampler,
                        self.frame_interval,
                    ));
                }
                self.publish(slot);
            }

            Effect::StopFrameStream => {
                if let Some(frames) = slot.handle.as_mut().and_then(|h| h.frames.take()) {
                    frames.stop();
                }
                self.publish(slot);
            }

            Effect::CloseSession => {
                if let Some(handle) = &slot.handle {
                    if let Err(e) = handle.link.close().await {
                        tracing::debug!(session = %handle.id, error = %e, "Close failed, dropping session anyway");
                    }
                }
            }

            Effect::ReleaseHandle => {
                if let Some(handle) = slot.handle.take() {
                    tracing::info!(session = %handle.id, "Live session released");
                }
            }
        }
    }

    fn publish(&self, slot: &SessionSlot) {
        self.status.send_replace(slot.snapshot());
    }

    fn notify(&self, notice: SessionNotice) {
        // Nobody listening is not an error
        let _ = self.notices.send(notice);
    }
}

/// Feed inbound events for one session into the state machine.
///
/// Exits once the session it was started for is no longer the current one.
async fn pump_events(
    shared: Arc<Shared>,
    generation: u64,
    mut events: mpsc::Receiver<SessionEvent>,
) {
    while let Some(event) = events.recv().await {
        let mut slot = shared.slot.lock().await;
        if !is_current(&slot, generation) {
            return;
        }
        shared.apply(&mut slot, event).await;
    }

    // Transport went away without saying why
    let mut slot = shared.slot.lock().await;
    if is_current(&slot, generation) {
        shared
            .apply(&mut slot, SessionEvent::Closed { reason: None })
            .await;
    }
}

fn is_current(slot: &SessionSlot, generation: u64) -> bool {
    slot.handle
        .as_ref()
        .is_some_and(|h| h.generation == generation)
}
