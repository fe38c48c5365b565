//! Video source boundary
//!
//! The session manager only needs "the current frame, if there is one". A
//! camera driver, a capture card or a directory of stills all fit behind
//! `VideoSource`.

use crate::live::LiveError;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Which way the requested camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    User,
    #[allow(dead_code)] // API completeness
    Environment,
}

/// Capture hints passed to whatever opens the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoRequest {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: Facing,
}

impl VideoRequest {
    /// 640x480, front-facing
    pub const DEFAULT: Self = Self {
        ideal_width: 640,
        ideal_height: 480,
        facing: Facing::User,
    };
}

impl Default for VideoRequest {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Live video feed
pub trait VideoSource: Send + Sync {
    /// Current frame, or `None` while the source has not produced one yet
    fn snapshot(&self) -> Option<RgbImage>;
}

impl<T: VideoSource + ?Sized> VideoSource for Arc<T> {
    fn snapshot(&self) -> Option<RgbImage> {
        (**self).snapshot()
    }
}

/// Plays a directory of still images as a looping camera feed.
///
/// Files are loaded once, in name order. Each snapshot advances to the next
/// image.
pub struct ImageDirectorySource {
    dir: PathBuf,
    frames: Vec<RgbImage>,
    cursor: AtomicUsize,
}

impl ImageDirectorySource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LiveError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            LiveError::media(format!("Cannot open video directory {}: {e}", dir.display()))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_still_image(path))
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            match image::open(path) {
                Ok(img) => frames.push(img.to_rgb8()),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable frame");
                }
            }
        }

        if frames.is_empty() {
            return Err(LiveError::media(format!(
                "No readable JPEG or PNG frames in {}",
                dir.display()
            )));
        }

        tracing::info!(dir = %dir.display(), frames = frames.len(), "Video source ready");
        Ok(Self {
            dir: dir.to_path_buf(),
            frames,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl VideoSource for ImageDirectorySource {
    fn snapshot(&self) -> Option<RgbImage> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        self.frames.get(index).cloned()
    }
}

fn is_still_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "jpg" | "jpeg" | "png"
            )
        })
}
