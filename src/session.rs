//! # Session
//!
//! The application context a front end owns: the generator form state, the
//! last rendered preview, the last scan result, the merge list and the
//! engine handle. Nothing here
//! is global, so several sessions can live side by side.
//!
//! ## Usage
//!
//! ```
//! use qrdeck::payload::SchemeKind;
//! use qrdeck::session::Session;
//!
//! let mut session = Session::default();
//! session.generator.kind = SchemeKind::Tel;
//! session.generator.fields.set("tel", "+1 555 0100");
//!
//! let preview = session.regenerate()?.expect("payload is not empty");
//! assert_eq!(preview.payload, "tel:+1 555 0100");
//! # Ok::<(), qrdeck::QrDeckError>(())
//! ```

use std::sync::Arc;

use crate::compose::MergeList;
use crate::error::QrDeckError;
use crate::export::{self, ClipboardWriter, FileSaver};
use crate::payload::{FieldMap, PayloadRequest, SchemeKind, looks_like_url};
use crate::render::engine::{QrEngine, QrcodeEngine};
use crate::render::{self, Logo, RenderOptions, raster};

/// Generator form state.
#[derive(Debug, Clone, Default)]
pub struct GeneratorState {
    pub kind: SchemeKind,
    pub fields: FieldMap,
    /// Manual payload; when set it replaces the built payload.
    pub payload_override: Option<String>,
    pub options: RenderOptions,
}

impl GeneratorState {
    /// The payload that would be encoded right now.
    pub fn payload(&self) -> String {
        match &self.payload_override {
            Some(text) => text.trim().to_string(),
            None => PayloadRequest::from_fields(self.kind, &self.fields).encode(),
        }
    }
}

/// The last successful render.
#[derive(Debug, Clone)]
pub struct Preview {
    pub payload: String,
    pub meta: String,
    pub svg: String,
    pub png: Vec<u8>,
    pub looks_like_url: bool,
}

pub struct Session {
    engine: Arc<dyn QrEngine>,
    pub generator: GeneratorState,
    pub merge: MergeList,
    /// Text of the most recent successful scan.
    pub last_scan: Option<String>,
    preview: Option<Preview>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::new(QrcodeEngine))
    }
}

impl Session {
    pub fn new(engine: Arc<dyn QrEngine>) -> Self {
        Self {
            engine,
            generator: GeneratorState::default(),
            merge: MergeList::new(),
            last_scan: None,
            preview: None,
        }
    }

    pub fn engine(&self) -> &dyn QrEngine {
        self.engine.as_ref()
    }

    pub fn set_logo(&mut self, logo: Option<Logo>) {
        self.generator.options.logo = logo;
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Re-render from the current generator state.
    ///
    /// Returns `Ok(None)` and clears the preview when the payload is empty.
    /// On failure the previous preview is kept.
    pub fn regenerate(&mut self) -> Result<Option<&Preview>, QrDeckError> {
        let payload = self.generator.payload();
        if payload.is_empty() {
            self.preview = None;
            return Ok(None);
        }

        let options = self.generator.options.clone().clamped();
        let rendered = render::render_payload(self.engine.as_ref(), &payload, &options)
            .inspect_err(|e| log::warn!("render failed: {}", e))?;
        let png = raster::encode_png(&rendered.raster)?;

        self.preview = Some(Preview {
            looks_like_url: looks_like_url(&payload),
            payload,
            meta: rendered.meta,
            svg: rendered.svg,
            png,
        });
        Ok(self.preview.as_ref())
    }

    fn current(&self) -> Result<&Preview, QrDeckError> {
        self.preview
            .as_ref()
            .ok_or_else(|| QrDeckError::EmptyPayload("generate a QR code first".to_string()))
    }

    pub fn export_svg(&self, saver: &dyn FileSaver) -> Result<String, QrDeckError> {
        let preview = self.current()?;
        saver.save(export::QR_SVG_FILENAME, export::SVG_MIME, preview.svg.as_bytes())
    }

    pub fn export_png(&self, saver: &dyn FileSaver) -> Result<String, QrDeckError> {
        let preview = self.current()?;
        saver.save(export::QR_PNG_FILENAME, export::PNG_MIME, &preview.png)
    }

    /// Copy the current payload text.
    pub fn copy_payload(&self, clipboard: &dyn ClipboardWriter) -> Result<(), QrDeckError> {
        let payload = self.generator.payload();
        if payload.is_empty() {
            return Err(QrDeckError::EmptyPayload("nothing to copy".to_string()));
        }
        clipboard.write_text(&payload)
    }

    pub fn copy_scan(&self, clipboard: &dyn ClipboardWriter) -> Result<(), QrDeckError> {
        match self.last_scan.as_deref() {
            Some(text) if !text.is_empty() => clipboard.write_text(text),
            _ => Err(QrDeckError::EmptyPayload("no scan result to copy".to_string())),
        }
    }

    /// Generate the merged grid and save both exports.
    pub fn export_merged(&self, saver: &dyn FileSaver) -> Result<Vec<String>, QrDeckError> {
        let grid = self.merge.generate()?;
        Ok(vec![
            saver.save(export::MERGED_SVG_FILENAME, export::SVG_MIME, grid.svg.as_bytes())?,
            saver.save(export::MERGED_PNG_FILENAME, export::PNG_MIME, &grid.png()?)?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::engine::{EncodeParams, QrMatrix};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemorySaver {
        files: RefCell<Vec<(String, String, usize)>>,
    }

    impl FileSaver for MemorySaver {
        fn save(&self, filename: &str, mime: &str, bytes: &[u8]) -> Result<String, QrDeckError> {
            self.files
                .borrow_mut()
                .push((filename.to_string(), mime.to_string(), bytes.len()));
            Ok(format!("memory:{}", filename))
        }
    }

    #[derive(Default)]
    struct MemoryClipboard {
        text: RefCell<Option<String>>,
    }

    impl ClipboardWriter for MemoryClipboard {
        fn write_text(&self, text: &str) -> Result<(), QrDeckError> {
            *self.text.borrow_mut() = Some(text.to_string());
            Ok(())
        }
    }

    struct FailingEngine;

    impl QrEngine for FailingEngine {
        fn generate(&self, _payload: &str, _params: &EncodeParams) -> Result<QrMatrix, QrDeckError> {
            Err(QrDeckError::Generation("data too long".to_string()))
        }
    }

    fn text_session(text: &str) -> Session {
        let mut session = Session::default();
        session.generator.fields.set("text", text);
        session
    }

    #[test]
    fn test_empty_payload_is_nothing_to_render() {
        let mut session = text_session("   ");
        assert!(session.regenerate().unwrap().is_none());
        assert!(session.preview().is_none());
        assert!(session.export_svg(&MemorySaver::default()).is_err());
    }

    #[test]
    fn test_regenerate_and_export() {
        let mut session = text_session("https://example.com");
        let preview = session.regenerate().unwrap().unwrap();
        assert!(preview.looks_like_url);
        assert!(preview.meta.ends_with("ECC M"));

        let saver = MemorySaver::default();
        session.export_svg(&saver).unwrap();
        session.export_png(&saver).unwrap();
        let files = saver.files.borrow();
        assert_eq!(files[0].0, "qrcode.svg");
        assert_eq!(files[0].1, "image/svg+xml");
        assert_eq!(files[1].0, "qrcode.png");
    }

    #[test]
    fn test_payload_override() {
        let mut session = text_session("built");
        session.generator.payload_override = Some("  manual ".to_string());
        assert_eq!(session.generator.payload(), "manual");
    }

    #[test]
    fn test_failure_keeps_previous_preview() {
        let mut session = text_session("first");
        session.regenerate().unwrap();

        session.engine = Arc::new(FailingEngine);
        session.generator.fields.set("text", "second");
        let err = session.regenerate().unwrap_err();
        assert!(matches!(err, QrDeckError::Generation(_)));
        assert_eq!(session.preview().unwrap().payload, "first");
    }

    #[test]
    fn test_copy_payload() {
        let session = text_session("copy me");
        let clipboard = MemoryClipboard::default();
        session.copy_payload(&clipboard).unwrap();
        assert_eq!(clipboard.text.borrow().as_deref(), Some("copy me"));

        let empty = text_session("");
        assert!(empty.copy_payload(&clipboard).is_err());
    }

    #[test]
    fn test_copy_scan() {
        let mut session = Session::default();
        let clipboard = MemoryClipboard::default();
        assert!(matches!(
            session.copy_scan(&clipboard),
            Err(QrDeckError::EmptyPayload(_))
        ));
        assert!(clipboard.text.borrow().is_none());

        session.last_scan = Some("https://example.com/scanned".to_string());
        session.copy_scan(&clipboard).unwrap();
        assert_eq!(
            clipboard.text.borrow().as_deref(),
            Some("https://example.com/scanned")
        );
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut a = Session::default();
        let b = Session::default();
        a.merge
            .add(image::DynamicImage::new_rgb8(4, 4), "one")
            .unwrap();
        assert_eq!(a.merge.len(), 1);
        assert!(b.merge.is_empty());
    }
}
