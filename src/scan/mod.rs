//! # Capture / Decode Adapter
//!
//! Reads QR codes from a live video source or a still image.
//!
//! The adapter is written against three capability traits so the detector and
//! camera can be swapped (and stubbed in tests):
//!
//! - [`BarcodeScanner`]: finds codes in a frame ([`RqrrScanner`] by default)
//! - [`Camera`]: opens a [`VideoStream`] ([`FileCamera`] for the CLI)
//! - [`VideoStream`]: hands out the current frame; released on stop
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start──▶ Requesting ──camera ok──▶ Running ──stop──▶ Idle
//!                     │
//!                     └──detector unsupported / camera denied──▶ Idle
//! ```
//!
//! While running, one poll happens every interval (120 ms by default). Polls
//! never overlap. A result is only published if the adapter is still running
//! the same session when detection completes; a detection that finishes after
//! `stop` is dropped.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use qrdeck::scan::{FileCamera, RqrrScanner, ScanAdapter, ScanEvent};
//!
//! # async fn example() -> Result<(), qrdeck::QrDeckError> {
//! let adapter = ScanAdapter::new(Arc::new(RqrrScanner), Arc::new(FileCamera::new("frame.png")));
//! let mut events = adapter.subscribe();
//! adapter.start().await?;
//! if let Ok(ScanEvent::Decoded(text)) = events.recv().await {
//!     println!("{}", text);
//! }
//! adapter.stop().await;
//! # Ok(())
//! # }
//! ```

mod detector;
mod file_camera;

pub use detector::RqrrScanner;
pub use file_camera::FileCamera;

use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};

use crate::error::QrDeckError;

/// Format name a detector must report to be usable.
pub const QR_FORMAT: &str = "qr_code";

/// Delay between two polls of the video stream.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(120);

/// One code found in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub raw_value: String,
}

/// A barcode detector.
#[async_trait]
pub trait BarcodeScanner: Send + Sync {
    /// Format names this detector can read (e.g. `qr_code`).
    async fn supported_formats(&self) -> Result<Vec<String>, QrDeckError>;

    /// Find every code in `frame`. An empty vec means nothing was found.
    async fn detect(&self, frame: &DynamicImage) -> Result<Vec<Detection>, QrDeckError>;
}

/// A source of video streams.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Acquire a stream. Fails with [`QrDeckError::CameraUnavailable`] when
    /// access is denied or no device exists.
    async fn open(&self) -> Result<Box<dyn VideoStream>, QrDeckError>;
}

/// An open video stream.
pub trait VideoStream: Send {
    /// The current frame, or `None` when no frame is ready yet.
    fn current_frame(&mut self) -> Result<Option<DynamicImage>, QrDeckError>;

    /// Stop every track. The stream is dropped right after.
    fn release(&mut self);
}

/// Published by a running adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A code was decoded; carries the raw value.
    Decoded(String),
    /// One poll failed. The loop keeps running.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Requesting,
    Running,
}

struct Inner {
    phase: ScanPhase,
    /// Bumped on every start and stop; polls carry the value they started with.
    session: u64,
    stream: Option<Box<dyn VideoStream>>,
    last_result: Option<String>,
}

/// Continuous QR scanner over a [`Camera`] and a [`BarcodeScanner`].
pub struct ScanAdapter {
    scanner: Arc<dyn BarcodeScanner>,
    camera: Arc<dyn Camera>,
    interval: Duration,
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<ScanEvent>,
}

impl ScanAdapter {
    pub fn new(scanner: Arc<dyn BarcodeScanner>, camera: Arc<dyn Camera>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            scanner,
            camera,
            interval: DEFAULT_POLL_INTERVAL,
            inner: Arc::new(Mutex::new(Inner {
                phase: ScanPhase::Idle,
                session: 0,
                stream: None,
                last_result: None,
            })),
            events,
        }
    }

    /// Override the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> ScanPhase {
        self.inner.lock().await.phase
    }

    /// Most recent decoded value of any session.
    pub async fn last_result(&self) -> Option<String> {
        self.inner.lock().await.last_result.clone()
    }

    /// Start scanning. A no-op unless the adapter is idle.
    ///
    /// On failure the adapter is back in [`ScanPhase::Idle`] and `start` may
    /// be retried.
    pub async fn start(&self) -> Result<(), QrDeckError> {
        let session = {
            let mut inner = self.inner.lock().await;
            if inner.phase != ScanPhase::Idle {
                return Ok(());
            }
            inner.phase = ScanPhase::Requesting;
            inner.session += 1;
            inner.session
        };

        match self.acquire().await {
            Ok(mut stream) => {
                let mut inner = self.inner.lock().await;
                if inner.session != session {
                    // Stopped while the camera was being opened
                    stream.release();
                    return Ok(());
                }
                inner.stream = Some(stream);
                inner.phase = ScanPhase::Running;
                log::info!("scanner started");
            }
            Err(e) => {
                let mut inner = self.inner.lock().await;
                if inner.session == session {
                    inner.phase = ScanPhase::Idle;
                }
                log::warn!("scanner failed to start: {}", e);
                return Err(e);
            }
        }

        tokio::spawn(poll_loop(
            self.scanner.clone(),
            self.inner.clone(),
            self.events.clone(),
            self.interval,
            session,
        ));
        Ok(())
    }

    async fn acquire(&self) -> Result<Box<dyn VideoStream>, QrDeckError> {
        let formats = self.scanner.supported_formats().await?;
        if !formats.iter().any(|f| f == QR_FORMAT) {
            return Err(QrDeckError::DetectorUnsupported(
                "detector cannot read QR codes".to_string(),
            ));
        }
        self.camera.open().await
    }

    /// Stop scanning and release the stream. Safe to call at any time.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        inner.session += 1;
        if let Some(mut stream) = inner.stream.take() {
            stream.release();
        }
        if inner.phase != ScanPhase::Idle {
            log::info!("scanner stopped");
        }
        inner.phase = ScanPhase::Idle;
    }

    /// Decode a still image with this adapter's detector.
    pub async fn decode_still(&self, image: &DynamicImage) -> Result<String, QrDeckError> {
        let text = decode_image(self.scanner.as_ref(), image).await?;
        self.inner.lock().await.last_result = Some(text.clone());
        Ok(text)
    }
}

/// One-shot decode: the first code found in `image`.
///
/// Fails with [`QrDeckError::NoCodeFound`] when the image holds no code.
pub async fn decode_image(scanner: &dyn BarcodeScanner, image: &DynamicImage) -> Result<String, QrDeckError> {
    scanner
        .detect(image)
        .await?
        .into_iter()
        .next()
        .map(|d| d.raw_value)
        .ok_or(QrDeckError::NoCodeFound)
}

async fn poll_loop(
    scanner: Arc<dyn BarcodeScanner>,
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<ScanEvent>,
    interval: Duration,
    session: u64,
) {
    loop {
        let frame = {
            let mut guard = inner.lock().await;
            if guard.phase != ScanPhase::Running || guard.session != session {
                break;
            }
            match guard.stream.as_mut().map(|s| s.current_frame()) {
                Some(Ok(frame)) => frame.map(Ok),
                Some(Err(e)) => Some(Err(e)),
                None => break,
            }
        };

        let outcome = match frame {
            Some(Ok(frame)) => scanner.detect(&frame).await.map(|found| found.into_iter().next()),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        };

        {
            let mut guard = inner.lock().await;
            if guard.phase != ScanPhase::Running || guard.session != session {
                log::debug!("dropping detection from a stopped scan");
                break;
            }
            match outcome {
                Ok(Some(detection)) => {
                    guard.last_result = Some(detection.raw_value.clone());
                    // No subscribers is fine
                    let _ = events.send(ScanEvent::Decoded(detection.raw_value));
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("scan poll failed: {}", e);
                    let _ = events.send(ScanEvent::Failed(e.to_string()));
                }
            }
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;

    /// Detector stub: reports a fixed value, optionally after a delay.
    struct StubScanner {
        formats: Vec<String>,
        value: Option<String>,
        delay: Duration,
    }

    impl StubScanner {
        fn reading(value: &str) -> Self {
            Self {
                formats: vec![QR_FORMAT.to_string()],
                value: Some(value.to_string()),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl BarcodeScanner for StubScanner {
        async fn supported_formats(&self) -> Result<Vec<String>, QrDeckError> {
            Ok(self.formats.clone())
        }

        async fn detect(&self, _frame: &DynamicImage) -> Result<Vec<Detection>, QrDeckError> {
            tokio::time::sleep(self.delay).await;
            Ok(self
                .value
                .iter()
                .map(|v| Detection { raw_value: v.clone() })
                .collect())
        }
    }

    struct StubStream {
        released: Arc<AtomicUsize>,
    }

    impl VideoStream for StubStream {
        fn current_frame(&mut self) -> Result<Option<DynamicImage>, QrDeckError> {
            Ok(Some(DynamicImage::new_rgb8(4, 4)))
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct StubCamera {
        deny: bool,
        opened: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Camera for StubCamera {
        async fn open(&self) -> Result<Box<dyn VideoStream>, QrDeckError> {
            if self.deny {
                return Err(QrDeckError::CameraUnavailable("permission denied".into()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubStream {
                released: self.released.clone(),
            }))
        }
    }

    fn adapter(scanner: StubScanner, camera: StubCamera) -> ScanAdapter {
        ScanAdapter::new(Arc::new(scanner), Arc::new(camera)).with_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_decodes_and_publishes() {
        let adapter = adapter(StubScanner::reading("hello"), StubCamera::default());
        let mut events = adapter.subscribe();
        adapter.start().await.unwrap();
        assert_eq!(adapter.state().await, ScanPhase::Running);

        let event = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
        assert_eq!(event, ScanEvent::Decoded("hello".to_string()));
        assert_eq!(adapter.last_result().await.as_deref(), Some("hello"));

        adapter.stop().await;
        assert_eq!(adapter.state().await, ScanPhase::Idle);
    }

    #[tokio::test]
    async fn test_unsupported_detector() {
        let scanner = StubScanner {
            formats: vec!["ean_13".to_string()],
            value: None,
            delay: Duration::ZERO,
        };
        let camera = StubCamera::default();
        let opened = camera.opened.clone();
        let adapter = adapter(scanner, camera);

        let err = adapter.start().await.unwrap_err();
        assert!(matches!(err, QrDeckError::DetectorUnsupported(_)));
        assert_eq!(adapter.state().await, ScanPhase::Idle);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_camera_denied_then_retry() {
        let camera = StubCamera {
            deny: true,
            ..Default::default()
        };
        let adapter = adapter(StubScanner::reading("x"), camera);
        let err = adapter.start().await.unwrap_err();
        assert!(matches!(err, QrDeckError::CameraUnavailable(_)));
        assert_eq!(adapter.state().await, ScanPhase::Idle);
        // Still retryable
        assert!(adapter.start().await.is_err());
    }

    #[tokio::test]
    async fn test_start_twice_opens_one_stream() {
        let camera = StubCamera::default();
        let opened = camera.opened.clone();
        let released = camera.released.clone();
        let adapter = adapter(StubScanner::reading("x"), camera);

        adapter.start().await.unwrap();
        adapter.start().await.unwrap();
        assert_eq!(opened.load(Ordering::SeqCst), 1);

        adapter.stop().await;
        adapter.stop().await;
        assert_eq!(released.load(Ordering::SeqCst), 1);

        // Slot can be reacquired after stop
        adapter.start().await.unwrap();
        assert_eq!(opened.load(Ordering::SeqCst), 2);
        adapter.stop().await;
    }

    #[tokio::test]
    async fn test_detection_after_stop_is_dropped() {
        let scanner = StubScanner {
            delay: Duration::from_millis(200),
            ..StubScanner::reading("late")
        };
        let adapter = adapter(scanner, StubCamera::default());
        let mut events = adapter.subscribe();

        adapter.start().await.unwrap();
        // Let the first poll begin, then stop while it is detecting
        tokio::time::sleep(Duration::from_millis(50)).await;
        adapter.stop().await;

        let result = timeout(Duration::from_millis(400), events.recv()).await;
        assert!(result.is_err(), "no event may arrive after stop");
        assert_eq!(adapter.last_result().await, None);
    }

    #[tokio::test]
    async fn test_decode_still() {
        let adapter = adapter(StubScanner::reading("still"), StubCamera::default());
        let text = adapter.decode_still(&DynamicImage::new_rgb8(2, 2)).await.unwrap();
        assert_eq!(text, "still");

        let empty = StubScanner {
            value: None,
            ..StubScanner::reading("")
        };
        let err = decode_image(&empty, &DynamicImage::new_rgb8(2, 2)).await.unwrap_err();
        assert!(matches!(err, QrDeckError::NoCodeFound));
    }
}
