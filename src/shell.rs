//! Headless application shell
//!
//! Owns the particle field and drives it at display cadence. Shape changes
//! and session control arrive as commands; gestures arrive from the session
//! manager's notice channel and are only ever read by the render loop.

use crate::gesture::GestureSignal;
use crate::live::{LiveConnector, LiveSessionManager, SessionNotice};
use crate::particles::{ParticleField, PointCloud, RenderSurface, Shape};
use crate::video::VideoSource;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// User command, one per input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Shape(Shape),
    Connect,
    Disconnect,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "connect" => Ok(Command::Connect),
            "disconnect" => Ok(Command::Disconnect),
            "status" => Ok(Command::Status),
            "quit" | "exit" => Ok(Command::Quit),
            other => other
                .parse::<Shape>()
                .map(Command::Shape)
                .map_err(|_| format!("unknown command: {other}")),
        }
    }
}

/// Read commands from stdin until EOF
pub fn spawn_stdin_commands() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(input = %line.trim(), "Ignoring input");
                        eprintln!("{e} (try: heart, firework, connect, disconnect, status, quit)");
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

/// Logs a summary of the cloud about once per second
pub struct TracingSurface {
    frames: u64,
    every: u64,
}

impl TracingSurface {
    pub fn new(fps: u32) -> Self {
        Self {
            frames: 0,
            every: u64::from(fps.max(1)),
        }
    }
}

impl RenderSurface for TracingSurface {
    fn present(&mut self, cloud: &PointCloud<'_>) {
        self.frames += 1;
        if self.frames % self.every != 0 {
            return;
        }
        let extent = cloud
            .positions
            .iter()
            .fold(0.0_f32, |acc, v| acc.max(v.abs()));
        tracing::debug!(
            frame = self.frames,
            particles = cloud.positions.len() / 3,
            extent,
            rotation_y = cloud.rotation_y,
            "Frame presented"
        );
    }
}

/// Wires the field, the surface and (when configured) the live session
pub struct Shell<C: LiveConnector + 'static> {
    field: ParticleField,
    surface: Box<dyn RenderSurface>,
    manager: Option<Arc<LiveSessionManager<C>>>,
    video: Option<Arc<dyn VideoSource>>,
    frame_period: Duration,
}

impl<C: LiveConnector + 'static> Shell<C> {
    pub fn new(
        field: ParticleField,
        surface: Box<dyn RenderSurface>,
        manager: Option<Arc<LiveSessionManager<C>>>,
        video: Option<Arc<dyn VideoSource>>,
        fps: u32,
    ) -> Self {
        Self {
            field,
            surface,
            manager,
            video,
            frame_period: Duration::from_secs(1) / fps.max(1),
        }
    }

    /// Run until `quit`, end of input, or `shutdown`. The session is
    /// disconnected on the way out. Returns the field as it was at exit.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        notices: Option<mpsc::UnboundedReceiver<SessionNotice>>,
        shutdown: CancellationToken,
    ) -> ParticleField {
        let (gesture_tx, gesture_rx) = watch::channel(GestureSignal::Unknown);
        if let Some(notices) = notices {
            tokio::spawn(forward_notices(notices, gesture_tx));
        }

        let mut ticker = interval(self.frame_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();

        tracing::info!(shape = %self.field.shape(), particles = self.field.len(), "Render loop started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last).as_secs_f32();
                    last = now;
                    let gesture = *gesture_rx.borrow();
                    self.field.update(dt, gesture);
                    self.surface.present(&self.field.point_cloud());
                }
                command = commands.recv() => match command {
                    None | Some(Command::Quit) => break,
                    Some(command) => self.handle(command),
                },
            }
        }

        if let Some(manager) = &self.manager {
            manager.disconnect().await;
        }
        tracing::info!("Render loop stopped");
        self.field
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Shape(shape) => {
                tracing::info!(shape = %shape, "Shape selected");
                self.field.set_shape(shape);
            }
            Command::Connect => {
                let Some(manager) = &self.manager else {
                    tracing::warn!("Live session not configured; set GEMINI_API_KEY");
                    return;
                };
                let Some(video) = &self.video else {
                    tracing::warn!("No video source; set HAND_PARTICLES_VIDEO_DIR");
                    return;
                };
                // Keep rendering through the handshake
                let manager = Arc::clone(manager);
                let video = Arc::clone(video);
                tokio::spawn(async move { manager.connect(video).await });
            }
            Command::Disconnect => {
                if let Some(manager) = &self.manager {
                    let manager = Arc::clone(manager);
                    tokio::spawn(async move { manager.disconnect().await });
                }
            }
            Command::Status => {
                let animation = self.field.animation();
                match &self.manager {
                    Some(manager) => {
                        let status = manager.status();
                        tracing::info!(
                            connected = status.connected,
                            streaming = status.streaming,
                            gesture = %status.last_gesture,
                            shape = %self.field.shape(),
                            scale = animation.current_scale,
                            target = animation.target_scale,
                            "Status"
                        );
                    }
                    None => tracing::info!(
                        connected = false,
                        shape = %self.field.shape(),
                        scale = animation.current_scale,
                        "Status"
                    ),
                }
            }
            Command::Quit => {}
        }
    }
}

/// Forward gesture notices into the render loop's input and log status changes
async fn forward_notices(
    mut notices: mpsc::UnboundedReceiver<SessionNotice>,
    gesture: watch::Sender<GestureSignal>,
) {
    while let Some(notice) = notices.recv().await {
        match notice {
            SessionNotice::Gesture(g) => {
                gesture.send_replace(g);
            }
            SessionNotice::Status { connected: true } => tracing::info!("Live session connected"),
            // The field keeps the last gesture it saw
            SessionNotice::Status { connected: false } => {
                tracing::info!("Live session disconnected");
            }
        }
    }
}
