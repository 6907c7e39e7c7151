//! QR engine seam.
//!
//! The symbol itself (data encoding, Reed-Solomon, masking, format info) is
//! produced by the `qrcode` crate. Everything downstream only sees a
//! [`ModuleGrid`]: a square of dark/light modules.
//!
//! The byte encoding of the payload is an explicit parameter of every call
//! ([`EncodeParams::encoding`]) rather than engine-wide state, so one engine can
//! serve callers with different needs.

use qrcode::{Color, EcLevel, QrCode, Version};
use serde::{Deserialize, Serialize};

use super::ErrorLevel;
use crate::error::QrDeckError;

/// Highest QR version.
pub const MAX_VERSION: u8 = 40;

/// Read-only view of a generated QR symbol.
pub trait ModuleGrid {
    /// Number of modules along one side.
    fn module_count(&self) -> usize;

    /// Whether the module at (row, col) is dark.
    fn is_dark(&self, row: usize, col: usize) -> bool;
}

/// How payload text is turned into bytes before it reaches the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// UTF-8 bytes (default; what modern scanners expect)
    #[default]
    Utf8,
    /// ISO-8859-1 / Windows-1252 bytes; fails on characters outside it
    Latin1,
}

impl TextEncoding {
    /// Convert payload text to engine input bytes.
    pub fn to_bytes(self, payload: &str) -> Result<Vec<u8>, QrDeckError> {
        match self {
            TextEncoding::Utf8 => Ok(payload.as_bytes().to_vec()),
            TextEncoding::Latin1 => {
                let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(payload);
                if had_errors {
                    return Err(QrDeckError::Generation(
                        "payload contains characters outside Latin-1".to_string(),
                    ));
                }
                Ok(bytes.into_owned())
            }
        }
    }
}

/// Per-call engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    /// QR version 1-40, or 0 for the smallest version that fits.
    pub version: u8,
    pub ecc: ErrorLevel,
    pub encoding: TextEncoding,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            version: 0,
            ecc: ErrorLevel::M,
            encoding: TextEncoding::Utf8,
        }
    }
}

/// Owned module matrix, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    count: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Build a matrix from row-major dark flags.
    ///
    /// Returns `None` when `modules.len() != count * count`.
    pub fn new(count: usize, modules: Vec<bool>) -> Option<Self> {
        (modules.len() == count * count).then_some(Self { count, modules })
    }

    /// Number of dark modules.
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&dark| dark).count()
    }
}

impl ModuleGrid for QrMatrix {
    fn module_count(&self) -> usize {
        self.count
    }

    fn is_dark(&self, row: usize, col: usize) -> bool {
        row < self.count && col < self.count && self.modules[row * self.count + col]
    }
}

/// A QR symbol generator.
pub trait QrEngine: Send + Sync {
    /// Generate the module grid for `payload`.
    ///
    /// Fails with [`QrDeckError::Generation`] when the payload does not fit
    /// the requested version / ECC level.
    fn generate(&self, payload: &str, params: &EncodeParams) -> Result<QrMatrix, QrDeckError>;
}

/// [`QrEngine`] backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEngine;

impl QrEngine for QrcodeEngine {
    fn generate(&self, payload: &str, params: &EncodeParams) -> Result<QrMatrix, QrDeckError> {
        if params.version > MAX_VERSION {
            return Err(QrDeckError::Generation(format!(
                "version {} is out of range (0-{})",
                params.version, MAX_VERSION
            )));
        }

        let bytes = params.encoding.to_bytes(payload)?;
        let ec_level: EcLevel = params.ecc.into();

        let code = if params.version == 0 {
            QrCode::with_error_correction_level(&bytes, ec_level)
        } else {
            QrCode::with_version(&bytes, Version::Normal(params.version as i16), ec_level)
        }
        .map_err(|e| {
            log::debug!("qrcode rejected {} byte payload: {}", bytes.len(), e);
            QrDeckError::Generation(e.to_string())
        })?;

        let count = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|color| color == Color::Dark)
            .collect();

        QrMatrix::new(count, modules)
            .ok_or_else(|| QrDeckError::Generation("engine returned a non-square grid".into()))
    }
}
