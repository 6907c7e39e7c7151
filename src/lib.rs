//! # qrdeck - QR Code Toolkit
//!
//! qrdeck builds QR payloads from structured fields, renders them to SVG and
//! PNG, reads codes back from images, and composes several codes onto one
//! sheet. It provides:
//!
//! - **Payload encoding**: Wi-Fi, tel, email, SMS, geo and vCard conventions
//! - **Rendering**: single-path SVG, crisp rasters, optional center logo
//! - **Scanning**: still images and a polling scan loop over a video source
//! - **Composition**: batch sheets from text lines, merged grids of 2-4 images
//!
//! ## Quick Start
//!
//! ```
//! use qrdeck::payload::{FieldMap, PayloadRequest, SchemeKind};
//! use qrdeck::render::{self, RenderOptions, engine::QrcodeEngine};
//!
//! let fields = FieldMap::new()
//!     .with("ssid", "Home")
//!     .with("password", "s3cret;1");
//! let payload = PayloadRequest::from_fields(SchemeKind::Wifi, &fields).encode();
//! assert_eq!(payload, r"WIFI:T:WPA;S:Home;P:s3cret\;1;H:false;;");
//!
//! let output = render::render_payload(&QrcodeEngine, &payload, &RenderOptions::default())?;
//! println!("{}", output.meta);
//! # Ok::<(), qrdeck::QrDeckError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`payload`] | Payload encoder and form field maps |
//! | [`render`] | QR engine seam, SVG/raster output, logo overlay |
//! | [`scan`] | Detector/camera traits and the scan adapter |
//! | [`compose`] | Batch sheets and merged grids |
//! | [`export`] | File and clipboard destinations |
//! | [`session`] | Application context tying the pieces together |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod compose;
pub mod error;
pub mod export;
pub mod payload;
pub mod render;
pub mod scan;
pub mod server;
pub mod session;

// Re-exports for convenience
pub use error::QrDeckError;
pub use session::Session;
