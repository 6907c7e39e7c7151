//! # Rendering Module
//!
//! Turns a payload into a QR module grid (via the [`engine`]) and the grid into
//! images.
//!
//! ## Modules
//!
//! - [`engine`]: the `QrEngine` seam over the `qrcode` crate
//! - [`svg`]: single-path SVG documents
//! - [`raster`]: crisp RGBA rasters and PNG encoding
//! - [`logo`]: optional center logo overlay (raster only)
//! - [`font`]: bitmap label text for composed sheets
//!
//! ## Usage Example
//!
//! ```
//! use qrdeck::render::{self, RenderOptions, engine::QrcodeEngine};
//!
//! let options = RenderOptions::default();
//! let output = render::render_payload(&QrcodeEngine, "https://example.com", &options)?;
//! assert!(output.svg.starts_with("<svg"));
//! assert_eq!(output.raster.width(), output.raster.height());
//! # Ok::<(), qrdeck::QrDeckError>(())
//! ```

pub mod engine;
pub mod font;
pub mod logo;
pub mod raster;
pub mod svg;

use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::QrDeckError;
use engine::{EncodeParams, ModuleGrid, QrEngine, TextEncoding};

/// QR error correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ErrorLevel {
    /// ~7% recovery
    L,
    /// ~15% recovery
    #[default]
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

impl ErrorLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorLevel::L => "L",
            ErrorLevel::M => "M",
            ErrorLevel::Q => "Q",
            ErrorLevel::H => "H",
        }
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "L" => Ok(ErrorLevel::L),
            "M" => Ok(ErrorLevel::M),
            "Q" => Ok(ErrorLevel::Q),
            "H" => Ok(ErrorLevel::H),
            _ => Err(format!("unknown error correction level '{}' (use L, M, Q or H)", s)),
        }
    }
}

impl From<ErrorLevel> for qrcode::EcLevel {
    fn from(level: ErrorLevel) -> Self {
        match level {
            ErrorLevel::L => qrcode::EcLevel::L,
            ErrorLevel::M => qrcode::EcLevel::M,
            ErrorLevel::Q => qrcode::EcLevel::Q,
            ErrorLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl Serialize for ErrorLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A `#RRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor([u8; 3]);

impl HexColor {
    pub const BLACK: HexColor = HexColor([0x00, 0x00, 0x00]);
    pub const WHITE: HexColor = HexColor([0xff, 0xff, 0xff]);
    /// Default QR foreground (near-black navy)
    pub const INK: HexColor = HexColor([0x0b, 0x12, 0x20]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        HexColor([r, g, b])
    }

    /// Parse exactly `#` followed by six hex digits.
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(HexColor([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Parse, falling back to `fallback` on malformed input.
    pub fn parse_or(s: &str, fallback: HexColor) -> Self {
        Self::parse(s).unwrap_or(fallback)
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, 255])
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HexColor::parse(s).ok_or_else(|| format!("invalid color '{}' (expected #RRGGBB)", s))
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Largest logo footprint, as a fraction of the raster side.
pub const MAX_LOGO_RATIO: f32 = 0.35;

/// Center logo drawn over the raster output.
#[derive(Debug, Clone)]
pub struct Logo {
    pub image: Arc<DynamicImage>,
    /// Logo side as a fraction of the raster side, in `0..=0.35`.
    pub ratio: f32,
    /// Draw a rounded white pad behind the logo.
    pub white_backdrop: bool,
}

fn default_scale() -> u32 {
    10
}

fn default_quiet_zone() -> u32 {
    4
}

fn default_foreground() -> HexColor {
    HexColor::INK
}

fn default_background() -> HexColor {
    HexColor::WHITE
}

/// Options for a single QR render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default)]
    pub ecc: ErrorLevel,
    /// 0 = smallest version that fits
    #[serde(default)]
    pub version: u8,
    #[serde(default = "default_quiet_zone")]
    pub quiet_zone: u32,
    /// Raster pixels per module
    #[serde(default = "default_scale")]
    pub scale: u32,
    #[serde(default = "default_foreground")]
    pub foreground: HexColor,
    #[serde(default = "default_background")]
    pub background: HexColor,
    #[serde(default)]
    pub encoding: TextEncoding,
    #[serde(skip)]
    pub logo: Option<Logo>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ecc: ErrorLevel::M,
            version: 0,
            quiet_zone: default_quiet_zone(),
            scale: default_scale(),
            foreground: default_foreground(),
            background: default_background(),
            encoding: TextEncoding::Utf8,
            logo: None,
        }
    }
}

impl RenderOptions {
    /// Clamp numeric options into the ranges the generator form allows.
    pub fn clamped(mut self) -> Self {
        self.version = self.version.min(engine::MAX_VERSION);
        self.scale = self.scale.clamp(2, 40);
        self.quiet_zone = self.quiet_zone.min(12);
        if let Some(logo) = self.logo.as_mut() {
            logo.ratio = clamp_ratio(logo.ratio);
        }
        self
    }

    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            version: self.version,
            ecc: self.ecc,
            encoding: self.encoding,
        }
    }

    pub fn raster_style(&self) -> raster::RasterStyle {
        raster::RasterStyle {
            scale: self.scale,
            quiet_zone: self.quiet_zone,
            foreground: self.foreground,
            background: self.background,
        }
    }
}

pub(crate) fn clamp_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() {
        ratio.clamp(0.0, MAX_LOGO_RATIO)
    } else {
        0.0
    }
}

/// Result of one render pass: both representations of the same modules.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub module_count: usize,
    pub svg: String,
    pub raster: RgbaImage,
    /// Human-readable summary, e.g. `25×25 modules · view 33×33 · ECC M`
    pub meta: String,
}

/// Summary line shown next to a preview.
pub fn describe(module_count: usize, quiet_zone: u32, ecc: ErrorLevel) -> String {
    let dim = module_count + 2 * quiet_zone as usize;
    format!(
        "{}×{} modules · view {}×{} · ECC {}",
        module_count, module_count, dim, dim, ecc
    )
}

/// Render a grid that was already generated.
pub fn render_grid(grid: &dyn ModuleGrid, options: &RenderOptions) -> Result<Rendered, QrDeckError> {
    let svg = svg::build_svg(grid, options.quiet_zone, options.foreground, options.background);
    let mut raster = raster::render_raster(grid, &options.raster_style())?;
    if let Some(logo) = &options.logo {
        logo::draw_logo(&mut raster, logo);
    }

    Ok(Rendered {
        module_count: grid.module_count(),
        svg,
        raster,
        meta: describe(grid.module_count(), options.quiet_zone, options.ecc),
    })
}

/// Generate and render `payload`.
///
/// An empty payload is rejected with [`QrDeckError::EmptyPayload`].
pub fn render_payload(
    engine: &dyn QrEngine,
    payload: &str,
    options: &RenderOptions,
) -> Result<Rendered, QrDeckError> {
    if payload.is_empty() {
        return Err(QrDeckError::EmptyPayload(
            "enter content to generate a QR code".to_string(),
        ));
    }
    let grid = engine.generate(payload, &options.encode_params())?;
    render_grid(&grid, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::QrcodeEngine;

    #[test]
    fn test_error_level_parse() {
        assert_eq!("q".parse::<ErrorLevel>(), Ok(ErrorLevel::Q));
        assert_eq!(" H ".parse::<ErrorLevel>(), Ok(ErrorLevel::H));
        assert!("X".parse::<ErrorLevel>().is_err());
        assert_eq!(ErrorLevel::default(), ErrorLevel::M);
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(HexColor::parse("#0B1220"), Some(HexColor::INK));
        assert_eq!(HexColor::INK.to_string(), "#0b1220");
        assert_eq!(HexColor::parse("0b1220"), None);
        assert_eq!(HexColor::parse("#fff"), None);
        assert_eq!(HexColor::parse("#gg0000"), None);
        assert_eq!(HexColor::parse_or("red", HexColor::WHITE), HexColor::WHITE);
        assert_eq!(HexColor::rgb(1, 2, 3).to_rgba(), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_options_from_json_defaults() {
        let opts: RenderOptions = serde_json::from_str(r#"{"ecc":"h","scale":99}"#).unwrap();
        assert_eq!(opts.ecc, ErrorLevel::H);
        assert_eq!(opts.quiet_zone, 4);
        assert_eq!(opts.foreground, HexColor::INK);
        let opts = opts.clamped();
        assert_eq!(opts.scale, 40);

        assert!(serde_json::from_str::<RenderOptions>(r#"{"foreground":"blue"}"#).is_err());
    }

    #[test]
    fn test_clamp_ranges() {
        let opts = RenderOptions {
            version: 77,
            scale: 0,
            quiet_zone: 50,
            ..Default::default()
        }
        .clamped();
        assert_eq!(opts.version, 40);
        assert_eq!(opts.scale, 2);
        assert_eq!(opts.quiet_zone, 12);
        assert_eq!(clamp_ratio(0.9), MAX_LOGO_RATIO);
        assert_eq!(clamp_ratio(f32::NAN), 0.0);
        assert_eq!(clamp_ratio(-1.0), 0.0);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(21, 4, ErrorLevel::M), "21×21 modules · view 29×29 · ECC M");
    }

    #[test]
    fn test_render_payload() {
        let opts = RenderOptions {
            scale: 3,
            quiet_zone: 2,
            ..Default::default()
        };
        let out = render_payload(&QrcodeEngine, "hello", &opts).unwrap();
        assert_eq!(out.module_count, 21);
        assert_eq!(out.raster.width(), (21 + 4) * 3);
        assert!(out.svg.contains("viewBox=\"0 0 25 25\""));
    }

    #[test]
    fn test_render_payload_unclamped_logo_ratio() {
        let opts = RenderOptions {
            scale: 4,
            logo: Some(Logo {
                image: std::sync::Arc::new(image::DynamicImage::new_rgba8(8, 8)),
                ratio: 1.5,
                white_backdrop: true,
            }),
            ..Default::default()
        };
        let out = render_payload(&QrcodeEngine, "hello", &opts).unwrap();
        assert_eq!(out.raster.width(), (21 + 8) * 4);
    }

    #[test]
    fn test_empty_payload_rejected() {
        let err = render_payload(&QrcodeEngine, "", &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, QrDeckError::EmptyPayload(_)));
    }
}
