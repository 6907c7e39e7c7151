//! Center logo overlay.
//!
//! Purely cosmetic: the overlay is painted over finished raster pixels and
//! never touches module data. Whether the code still scans depends on the
//! error correction level covering the hidden modules.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::{Logo, clamp_ratio};

/// Logo placement computed for a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoLayout {
    /// Side of the square logo footprint
    pub size: u32,
    /// Top-left of the footprint
    pub x: u32,
    pub y: u32,
    /// Backdrop padding around the footprint
    pub pad: u32,
    /// Backdrop corner radius before clamping to the pad rectangle
    pub radius: u32,
}

impl LogoLayout {
    /// Compute the layout for a `width × height` canvas, or `None` when the
    /// logo would be empty.
    pub fn compute(width: u32, height: u32, ratio: f32) -> Option<Self> {
        if !(ratio > 0.0) {
            return None;
        }
        let size = (width.min(height) as f32 * ratio).floor() as u32;
        if size == 0 {
            return None;
        }
        Some(Self {
            size,
            x: width.saturating_sub(size) / 2,
            y: height.saturating_sub(size) / 2,
            pad: (size as f32 * 0.12).floor() as u32,
            radius: (size as f32 * 0.16).floor() as u32,
        })
    }

    /// Destination rectangle `(x, y, w, h)` of an `img_w × img_h` logo scaled
    /// to fit the footprint with its aspect ratio preserved.
    pub fn fit(&self, img_w: u32, img_h: u32) -> Option<(u32, u32, u32, u32)> {
        if img_w == 0 || img_h == 0 {
            return None;
        }
        let size = self.size as f32;
        let scale = (size / img_w as f32).min(size / img_h as f32);
        let w = (img_w as f32 * scale).floor() as u32;
        let h = (img_h as f32 * scale).floor() as u32;
        if w == 0 || h == 0 {
            return None;
        }
        let dx = (self.x as f32 + (size - w as f32) / 2.0).floor() as u32;
        let dy = (self.y as f32 + (size - h as f32) / 2.0).floor() as u32;
        Some((dx, dy, w, h))
    }
}

/// Draw `logo` centered on `canvas`. No-op when the ratio is not positive.
///
/// The ratio is clamped to the same range as [`RenderOptions::clamped`](super::RenderOptions::clamped).
pub fn draw_logo(canvas: &mut RgbaImage, logo: &Logo) {
    let ratio = clamp_ratio(logo.ratio);
    let Some(layout) = LogoLayout::compute(canvas.width(), canvas.height(), ratio) else {
        return;
    };

    if logo.white_backdrop {
        let side = layout.size + 2 * layout.pad;
        fill_rounded_rect(
            canvas,
            layout.x as i64 - layout.pad as i64,
            layout.y as i64 - layout.pad as i64,
            side,
            side,
            layout.radius as f32,
            Rgba([255, 255, 255, 255]),
        );
    }

    let Some((dx, dy, w, h)) = layout.fit(logo.image.width(), logo.image.height()) else {
        return;
    };
    let scaled = imageops::resize(&logo.image.to_rgba8(), w, h, FilterType::Triangle);
    imageops::overlay(canvas, &scaled, dx as i64, dy as i64);
}

/// Fill a rounded rectangle. The radius is clamped to half the width/height.
pub fn fill_rounded_rect(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    radius: f32,
    color: Rgba<u8>,
) {
    let w = width as f32;
    let h = height as f32;
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);

    for py in 0..height as i64 {
        for px in 0..width as i64 {
            let cx = x + px;
            let cy = y + py;
            if cx < 0 || cy < 0 || cx >= canvas.width() as i64 || cy >= canvas.height() as i64 {
                continue;
            }

            // Pixel center relative to the rectangle
            let fx = px as f32 + 0.5;
            let fy = py as f32 + 0.5;
            let nearest_x = fx.clamp(r, w - r);
            let nearest_y = fy.clamp(r, h - r);
            let (dx, dy) = (fx - nearest_x, fy - nearest_y);
            if dx * dx + dy * dy <= r * r {
                canvas.put_pixel(cx as u32, cy as u32, color);
            }
        }
    }
}
