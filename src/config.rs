//! Application configuration from the environment

use crate::live::{LiveError, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::particles::Shape;
use std::path::PathBuf;

/// Render loop cadence when `HAND_PARTICLES_FPS` is unset
pub const DEFAULT_FPS: u32 = 60;

const MAX_FPS: u32 = 240;

/// Configuration for the shell and the live session
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub video_dir: Option<PathBuf>,
    pub initial_shape: Shape,
    pub fps: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let initial_shape = match get("HAND_PARTICLES_SHAPE") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "Unknown shape, using heart");
                Shape::default()
            }),
            None => Shape::default(),
        };

        let fps = get("HAND_PARTICLES_FPS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_FPS)
            .clamp(1, MAX_FPS);

        Self {
            api_key: get("GEMINI_API_KEY"),
            model: get("GEMINI_LIVE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: get("GEMINI_LIVE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            video_dir: get("HAND_PARTICLES_VIDEO_DIR").map(PathBuf::from),
            initial_shape,
            fps,
        }
    }

    /// API key for the live session. Template placeholders don't count.
    pub fn api_key_for_session(&self) -> Result<&str, LiveError> {
        match self.api_key.as_deref() {
            None => Err(LiveError::config("GEMINI_API_KEY is not set")),
            Some(key) if key.to_ascii_lowercase().contains("placeholder") => Err(
                LiveError::config("GEMINI_API_KEY still holds a placeholder value"),
            ),
            Some(key) => Ok(key),
        }
    }
}
