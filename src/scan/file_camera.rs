//! An image file used as a video source.
//!
//! Every frame re-reads the file, so replacing the file while a scan is
//! running feeds the scanner a new frame.

use async_trait::async_trait;
use image::DynamicImage;
use std::path::{Path, PathBuf};

use super::{Camera, VideoStream};
use crate::error::QrDeckError;

#[derive(Debug, Clone)]
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn open(&self) -> Result<Box<dyn VideoStream>, QrDeckError> {
        if !self.path.is_file() {
            return Err(QrDeckError::CameraUnavailable(format!(
                "{} is not a readable file",
                self.path.display()
            )));
        }
        log::debug!("opened file source {}", self.path.display());
        Ok(Box::new(FileStream {
            path: Some(self.path.clone()),
        }))
    }
}

struct FileStream {
    /// `None` once released
    path: Option<PathBuf>,
}

impl VideoStream for FileStream {
    fn current_frame(&mut self) -> Result<Option<DynamicImage>, QrDeckError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        match image::open(path) {
            Ok(frame) => Ok(Some(frame)),
            // A file being rewritten reads as truncated; wait for the next poll
            Err(image::ImageError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(QrDeckError::Image(format!("{}: {}", path.display(), e))),
        }
    }

    fn release(&mut self) {
        self.path = None;
    }
}
