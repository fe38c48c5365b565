//! Hand Particles - gesture-steered particle field
//!
//! Streams a video feed to a Gemini Live session that classifies the user's
//! hand as open or closed; the classification drives the scale of a
//! procedurally generated particle field.

mod config;
mod gesture;
mod live;
mod particles;
mod shell;
mod video;

use config::AppConfig;
use live::{GeminiLiveConnector, LiveSessionManager, SessionSetup};
use particles::ParticleField;
use shell::{Shell, TracingSurface};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video::{ImageDirectorySource, VideoRequest, VideoSource};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hand_particles=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env();

    // Video source
    let video: Option<Arc<dyn VideoSource>> = match &config.video_dir {
        Some(dir) => match ImageDirectorySource::open(dir) {
            Ok(source) => {
                let request = VideoRequest::default();
                tracing::info!(
                    dir = %source.dir().display(),
                    frames = source.frame_count(),
                    ideal_width = request.ideal_width,
                    ideal_height = request.ideal_height,
                    facing = ?request.facing,
                    "Using image directory as camera"
                );
                Some(Arc::new(source))
            }
            Err(e) => {
                tracing::error!(error = %e, "Video source unavailable");
                eprintln!("Camera unavailable: {e}. The particle field will run without a live session.");
                None
            }
        },
        None => {
            tracing::warn!("No video source configured. Set HAND_PARTICLES_VIDEO_DIR.");
            None
        }
    };

    // Live session
    let (manager, notices) = match config.api_key_for_session() {
        Ok(api_key) => {
            let connector = GeminiLiveConnector::new(config.endpoint.clone(), api_key);
            let (manager, notices) = LiveSessionManager::new(
                connector,
                SessionSetup::hand_gesture(config.model.clone()),
            );
            tracing::info!(model = %config.model, "Live session available");
            (Some(Arc::new(manager)), Some(notices))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Live session disabled; the field will not react to gestures");
            (None, None)
        }
    };

    // Shutdown on Ctrl-C
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
        }
        signal.cancel();
    });

    let field = ParticleField::new(config.initial_shape);
    let shell = Shell::new(
        field,
        Box::new(TracingSurface::new(config.fps)),
        manager,
        video,
        config.fps,
    );

    tracing::info!(
        shape = %config.initial_shape,
        fps = config.fps,
        "Ready. Commands: heart, firework, connect, disconnect, status, quit"
    );

    let commands = shell::spawn_stdin_commands();
    shell.run(commands, notices, shutdown).await;

    Ok(())
}
