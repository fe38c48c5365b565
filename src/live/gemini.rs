//! Gemini Live websocket transport
//!
//! One `BidiGenerateContent` websocket per session. The setup frame goes out
//! as soon as the socket opens; a reader task turns inbound frames into
//! `SessionEvent`s until the socket closes or the link is closed locally.

use super::error::{LiveError, LiveErrorKind};
use super::protocol::{ClientMessage, ServerMessage};
use super::setup::SessionSetup;
use super::state_machine::SessionEvent;
use super::transport::{LiveConnection, LiveConnector, LiveLink, EVENT_BUFFER};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

/// Public Gemini Live endpoint
pub const DEFAULT_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector for the Gemini Live API
pub struct GeminiLiveConnector {
    endpoint: String,
    api_key: String,
}

impl GeminiLiveConnector {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self) -> String {
        let sep = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{sep}key={}", self.endpoint, self.api_key)
    }
}

#[async_trait]
impl LiveConnector for GeminiLiveConnector {
    async fn connect(&self, setup: &SessionSetup) -> Result<LiveConnection, LiveError> {
        tracing::debug!(endpoint = %self.endpoint, model = %setup.model, "Opening live websocket");

        let (socket, _response) = connect_async(self.url()).await?;
        let (mut sink, stream) = socket.split();
        sink.send(Message::Text(setup.to_message().to_json()?)).await?;

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(read_loop(stream, tx, cancel.clone()));

        let link = WebSocketLink {
            sink: Mutex::new(sink),
            cancel,
        };
        Ok(LiveConnection {
            link: Arc::new(link),
            events: rx,
        })
    }
}

/// Outbound half of the websocket
struct WebSocketLink {
    sink: Mutex<SplitSink<WsStream, Message>>,
    /// Cancelled once the session is closed from either side
    cancel: CancellationToken,
}

#[async_trait]
impl LiveLink for WebSocketLink {
    async fn send(&self, message: ClientMessage) -> Result<(), LiveError> {
        if self.cancel.is_cancelled() {
            return Err(LiveError::closed("Session already closed"));
        }
        let text = message.to_json()?;
        self.sink.lock().await.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), LiveError> {
        if self.cancel.is_cancelled() {
            return Ok(());
        }
        self.cancel.cancel();
        match self.sink.lock().await.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    events: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => break,
            next = stream.next() => next,
        };

        let (batch, done) = match next {
            Some(Ok(Message::Text(text))) => (decode_frame(&text), false),
            // The service sends its JSON in binary frames
            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => (decode_frame(text), false),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping non-UTF-8 binary frame");
                    continue;
                }
            },
            Some(Ok(Message::Close(frame))) => {
                let reason = frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty());
                (vec![SessionEvent::Closed { reason }], true)
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                let error = LiveError::from(e);
                let event = match error.kind {
                    LiveErrorKind::Closed => SessionEvent::Closed { reason: None },
                    _ => SessionEvent::TransportError {
                        message: error.message,
                    },
                };
                (vec![event], true)
            }
            None => (vec![SessionEvent::Closed { reason: None }], true),
        };

        for event in batch {
            if events.send(event).await.is_err() {
                // Manager dropped the session
                cancel.cancel();
                return;
            }
        }
        if done {
            break;
        }
    }
    cancel.cancel();
}

fn decode_frame(text: &str) -> Vec<SessionEvent> {
    match ServerMessage::parse(text) {
        Ok(message) => message.into_events(),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable server frame");
            vec![]
        }
    }
}
