//! # Export
//!
//! Where finished images and payloads go: files and the system clipboard.
//!
//! Both are capability traits so the session can be driven against an
//! in-memory saver in tests and a real directory from the CLI.
//!
//! Filenames are fixed; a new export overwrites the previous one.

mod clipboard;

pub use clipboard::{ClipboardWriter, CommandClipboard};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::QrDeckError;

pub const QR_SVG_FILENAME: &str = "qrcode.svg";
pub const QR_PNG_FILENAME: &str = "qrcode.png";
pub const MERGED_SVG_FILENAME: &str = "merged-qr-grid.svg";
pub const MERGED_PNG_FILENAME: &str = "merged-qr-grid.png";
pub const BATCH_SVG_FILENAME: &str = "qrcode-batch.svg";
pub const BATCH_PNG_FILENAME: &str = "qrcode-batch.png";

pub const SVG_MIME: &str = "image/svg+xml";
pub const PNG_MIME: &str = "image/png";

/// Content type for an export filename, falling back to octet-stream.
pub fn mime_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

/// Destination for exported files.
pub trait FileSaver {
    /// Store `bytes` under `filename`. Returns where it went, for display.
    fn save(&self, filename: &str, mime: &str, bytes: &[u8]) -> Result<String, QrDeckError>;
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, filename: &str, mime: &str, bytes: &[u8]) -> Result<String, QrDeckError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, bytes)?;
        log::debug!("saved {} ({}, {} bytes)", path.display(), mime, bytes.len());
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_fixed_names() {
        assert_eq!(mime_for(QR_SVG_FILENAME), SVG_MIME);
        assert_eq!(mime_for(MERGED_PNG_FILENAME), PNG_MIME);
        assert_eq!(mime_for("payload.bin"), "application/octet-stream");
    }

    #[test]
    fn test_directory_saver_overwrites() {
        let dir = std::env::temp_dir().join(format!("qrdeck-export-{}", std::process::id()));
        let saver = DirectorySaver::new(&dir);

        saver.save(QR_SVG_FILENAME, SVG_MIME, b"<svg/>").unwrap();
        let location = saver.save(QR_SVG_FILENAME, SVG_MIME, b"<svg></svg>").unwrap();

        assert!(location.ends_with(QR_SVG_FILENAME));
        assert_eq!(fs::read(dir.join(QR_SVG_FILENAME)).unwrap(), b"<svg></svg>");
        fs::remove_dir_all(dir).ok();
    }
}
