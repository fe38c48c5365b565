//! Live session with the remote vision model
//!
//! Streams camera frames to a Gemini Live session and turns the model's
//! `setHandGesture` calls into gesture notices.

pub mod error;
pub mod frames;
mod gemini;
mod manager;
pub mod protocol;
mod setup;
pub mod state_machine;
pub mod tool;
mod transport;

#[cfg(test)]
pub mod testing;

pub use error::LiveError;
pub use gemini::{GeminiLiveConnector, DEFAULT_ENDPOINT};
pub use manager::{LiveSessionManager, SessionNotice};
pub use setup::{SessionSetup, DEFAULT_MODEL};
pub use transport::LiveConnector;
