//! Frame sampling and upload
//!
//! While a session is connected, frames are captured on a fixed cadence,
//! halved in both dimensions, JPEG-encoded and pushed as realtime input.

use super::error::LiveError;
use super::protocol::ClientMessage;
use super::transport::LiveLink;
use crate::video::VideoSource;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Time between frame captures (2 frames per second)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(500);

/// JPEG quality, 0-100
pub const JPEG_QUALITY: u8 = 50;

/// Both dimensions are divided by this before encoding
pub const DOWNSCALE: u32 = 2;

/// Turns raw frames into base64 JPEG payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampler {
    quality: u8,
}

impl FrameSampler {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    #[cfg(test)]
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode one frame. Returns `Ok(None)` for an empty frame.
    pub fn encode(&self, frame: &RgbImage) -> Result<Option<String>, LiveError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(None);
        }
        let width = (frame.width() / DOWNSCALE).max(1);
        let height = (frame.height() / DOWNSCALE).max(1);
        let small = image::imageops::resize(frame, width, height, FilterType::Triangle);

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality).encode_image(&small)?;
        Ok(Some(STANDARD.encode(jpeg)))
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

/// Periodic capture task bound to one session.
///
/// Stopping cancels the ticker at once. Encodes already in flight finish on
/// their own and are discarded by [`deliver_frame`].
pub struct FrameStream {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl FrameStream {
    pub fn spawn(
        source: Arc<dyn VideoSource>,
        link: Arc<dyn LiveLink>,
        sampler: FrameSampler,
        period: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(capture_loop(source, link, sampler, period, cancel.clone()));
        Self { cancel, task }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn capture_loop(
    source: Arc<dyn VideoSource>,
    link: Arc<dyn LiveLink>,
    sampler: FrameSampler,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Camera not producing yet; try again next tick
        let Some(frame) = source.snapshot() else {
            tracing::trace!("No video frame available");
            continue;
        };
        if frame.width() == 0 {
            continue;
        }

        let link = Arc::clone(&link);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(move || sampler.encode(&frame)).await {
                Ok(Ok(Some(data))) => {
                    deliver_frame(link.as_ref(), &cancel, data).await;
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "Frame encode failed"),
                Err(e) => tracing::warn!(error = %e, "Frame encode task failed"),
            }
        });
    }
    tracing::debug!("Frame capture stopped");
}

/// Send an encoded frame unless the stream was stopped meanwhile.
///
/// Returns whether the frame went out. A stopped stream or a closed link
/// drops the frame silently.
pub async fn deliver_frame(link: &dyn LiveLink, cancel: &CancellationToken, data: String) -> bool {
    if cancel.is_cancelled() {
        tracing::trace!("Discarding frame encoded after teardown");
        return false;
    }
    let bytes = data.len();
    match link.send(ClientMessage::jpeg_frame(data)).await {
        Ok(()) => {
            tracing::trace!(bytes, "Frame sent");
            true
        }
        Err(e) => {
            tracing::debug!(error = %e, "Dropping frame for closed session");
            false
        }
    }
}
