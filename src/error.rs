//! # Error Types
//!
//! This module defines error types used throughout the qrdeck library.
//!
//! Every error belongs to one of three [`ErrorCategory`] buckets. None of them
//! is fatal: callers report the message and keep their state retryable.

use thiserror::Error;

/// Main error type for qrdeck operations
#[derive(Debug, Error)]
pub enum QrDeckError {
    /// The payload (or batch input) is empty, so there is nothing to render
    #[error("Nothing to encode: {0}")]
    EmptyPayload(String),

    /// The QR engine rejected the payload (capacity exceeded, bad version...)
    #[error("QR generation failed: {0}")]
    Generation(String),

    /// No drawing surface could be allocated for a raster render
    #[error("Drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// The barcode detector is missing or cannot read QR codes
    #[error("Barcode detector unsupported: {0}")]
    DetectorUnsupported(String),

    /// The camera could not be opened
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// A one-shot detection found no QR code
    #[error("No QR code found")]
    NoCodeFound,

    /// Detection itself failed (bad frame, detector error)
    #[error("Detection failed: {0}")]
    Detection(String),

    /// Merge requested with fewer images than required
    #[error("Not enough codes: at least {min} images are required, got {actual}")]
    NotEnoughCodes { min: usize, actual: usize },

    /// Merge list is already full
    #[error("Too many codes: at most {max} images can be merged")]
    TooManyCodes { max: usize },

    /// Merge item id does not exist in the list
    #[error("Unknown merge item: {0}")]
    UnknownItem(String),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Clipboard access failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Malformed user input (bad field, bad option)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Server-level errors (bind, serve)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failure should be surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input/validation error, reported next to the control that caused it.
    Input,
    /// A collaborator (engine, detector, camera) is missing or refused access.
    Unavailable,
    /// A single attempt failed; retrying the action is fine.
    Transient,
}

impl QrDeckError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            QrDeckError::EmptyPayload(_)
            | QrDeckError::NotEnoughCodes { .. }
            | QrDeckError::TooManyCodes { .. }
            | QrDeckError::UnknownItem(_)
            | QrDeckError::InvalidInput(_) => ErrorCategory::Input,
            QrDeckError::DetectorUnsupported(_)
            | QrDeckError::CameraUnavailable(_)
            | QrDeckError::SurfaceUnavailable(_) => ErrorCategory::Unavailable,
            QrDeckError::Generation(_)
            | QrDeckError::NoCodeFound
            | QrDeckError::Detection(_)
            | QrDeckError::Image(_)
            | QrDeckError::Clipboard(_)
            | QrDeckError::Transport(_)
            | QrDeckError::Io(_) => ErrorCategory::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_limits_are_input_errors() {
        let err = QrDeckError::NotEnoughCodes { min: 2, actual: 1 };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(
            err.to_string(),
            "Not enough codes: at least 2 images are required, got 1"
        );
        assert_eq!(
            QrDeckError::TooManyCodes { max: 4 }.category(),
            ErrorCategory::Input
        );
    }

    #[test]
    fn test_collaborator_errors_are_unavailable() {
        assert_eq!(
            QrDeckError::DetectorUnsupported("no qr_code".into()).category(),
            ErrorCategory::Unavailable
        );
        assert_eq!(
            QrDeckError::CameraUnavailable("denied".into()).category(),
            ErrorCategory::Unavailable
        );
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: QrDeckError = io.into();
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert!(err.to_string().contains("gone"));
    }
}
