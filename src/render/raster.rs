//! Raster output.
//!
//! Modules are filled as whole `scale × scale` blocks on an RGBA surface. No
//! smoothing is ever applied, so module edges stay axis-aligned and crisp.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use super::HexColor;
use super::engine::ModuleGrid;
use crate::error::QrDeckError;

/// Largest surface side we are willing to allocate, in pixels.
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// Colors and geometry for a raster render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterStyle {
    pub scale: u32,
    pub quiet_zone: u32,
    pub foreground: HexColor,
    pub background: HexColor,
}

impl RasterStyle {
    /// Black modules on white, as used for batch sheets.
    pub fn monochrome(scale: u32, quiet_zone: u32) -> Self {
        Self {
            scale,
            quiet_zone,
            foreground: HexColor::BLACK,
            background: HexColor::WHITE,
        }
    }

    /// Side length in pixels for a grid of `module_count` modules.
    ///
    /// `None` on arithmetic overflow.
    pub fn side_for(&self, module_count: usize) -> Option<u32> {
        let scale = self.scale as u64;
        let modules = module_count as u64;
        let margin = (self.quiet_zone as u64).checked_mul(scale)?;
        let side = modules.checked_mul(scale)?.checked_add(margin.checked_mul(2)?)?;
        u32::try_from(side).ok()
    }
}

/// Allocate a surface filled with `fill`.
///
/// Fails with [`QrDeckError::SurfaceUnavailable`] for empty or oversized
/// dimensions.
pub fn allocate_surface(width: u32, height: u32, fill: Rgba<u8>) -> Result<RgbaImage, QrDeckError> {
    if width == 0 || height == 0 {
        return Err(QrDeckError::SurfaceUnavailable(format!(
            "cannot create a {}x{} surface",
            width, height
        )));
    }
    if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
        return Err(QrDeckError::SurfaceUnavailable(format!(
            "{}x{} exceeds the {}px surface limit",
            width, height, MAX_SURFACE_SIDE
        )));
    }
    Ok(RgbaImage::from_pixel(width, height, fill))
}

/// Fill an axis-aligned rectangle, clipped to the surface.
pub fn fill_rect(surface: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(width).min(surface.width());
    let y_end = y.saturating_add(height).min(surface.height());
    for py in y..y_end {
        for px in x..x_end {
            surface.put_pixel(px, py, color);
        }
    }
}

/// Render a module grid onto a fresh surface.
pub fn render_raster(grid: &dyn ModuleGrid, style: &RasterStyle) -> Result<RgbaImage, QrDeckError> {
    let count = grid.module_count();
    let side = style.side_for(count).ok_or_else(|| {
        QrDeckError::SurfaceUnavailable(format!(
            "{} modules at scale {} overflows the surface size",
            count, style.scale
        ))
    })?;

    let mut surface = allocate_surface(side, side, style.background.to_rgba())?;
    let margin = style.quiet_zone * style.scale;
    let fg = style.foreground.to_rgba();

    for row in 0..count {
        for col in 0..count {
            if !grid.is_dark(row, col) {
                continue;
            }
            let x = margin + col as u32 * style.scale;
            let y = margin + row as u32 * style.scale;
            fill_rect(&mut surface, x, y, style.scale, style.scale, fg);
        }
    }

    Ok(surface)
}

/// Encode a surface as PNG bytes.
pub fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>, QrDeckError> {
    let mut png_bytes = Vec::new();
    surface
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| QrDeckError::Image(format!("PNG encoding failed: {}", e)))?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::engine::QrMatrix;

    fn checker() -> QrMatrix {
        QrMatrix::new(2, vec![true, false, false, true]).unwrap()
    }

    #[test]
    fn test_geometry_and_pixels() {
        let style = RasterStyle::monochrome(3, 1);
        let img = render_raster(&checker(), &style).unwrap();
        // 2 modules * 3 + 2 * (1 * 3)
        assert_eq!(img.dimensions(), (12, 12));

        let black = Rgba([0, 0, 0, 255]);
        let white = Rgba([255, 255, 255, 255]);
        // Quiet zone
        assert_eq!(*img.get_pixel(0, 0), white);
        assert_eq!(*img.get_pixel(2, 2), white);
        // Module (0,0) occupies pixels 3..6
        assert_eq!(*img.get_pixel(3, 3), black);
        assert_eq!(*img.get_pixel(5, 5), black);
        // Module (0,1) is light
        assert_eq!(*img.get_pixel(6, 3), white);
        // Module (1,1) occupies 6..9
        assert_eq!(*img.get_pixel(8, 8), black);
        assert_eq!(*img.get_pixel(9, 9), white);
    }

    #[test]
    fn test_only_two_colors() {
        let style = RasterStyle {
            scale: 5,
            quiet_zone: 2,
            foreground: HexColor::INK,
            background: HexColor::rgb(250, 240, 230),
        };
        let img = render_raster(&checker(), &style).unwrap();
        let fg = HexColor::INK.to_rgba();
        let bg = HexColor::rgb(250, 240, 230).to_rgba();
        assert!(img.pixels().all(|p| *p == fg || *p == bg));
    }

    #[test]
    fn test_surface_unavailable() {
        let empty = QrMatrix::new(0, vec![]).unwrap();
        let err = render_raster(&empty, &RasterStyle::monochrome(4, 0)).unwrap_err();
        assert!(matches!(err, QrDeckError::SurfaceUnavailable(_)));

        let huge = RasterStyle::monochrome(u32::MAX, 4);
        assert!(render_raster(&checker(), &huge).is_err());

        assert!(allocate_surface(MAX_SURFACE_SIDE + 1, 10, Rgba([0, 0, 0, 255])).is_err());
    }

    #[test]
    fn test_png_signature() {
        let img = render_raster(&checker(), &RasterStyle::monochrome(2, 0)).unwrap();
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
