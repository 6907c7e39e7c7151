//! Bitmap label text for composed sheets.
//!
//! Uses the Spleen 8x16 bitmap font. Characters without a glyph (most
//! non-Latin scripts) are drawn as an outlined box; the SVG exports carry the
//! real text.

use image::{Rgba, RgbaImage};
use spleen_font::{FONT_8X16, PSF2Font};

/// Glyph cell width in pixels.
pub const GLYPH_WIDTH: u32 = 8;
/// Glyph cell height in pixels.
pub const GLYPH_HEIGHT: u32 = 16;

/// Width of `text` in pixels.
pub fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * GLYPH_WIDTH
}

/// Shorten `text` so it fits in `max_width` pixels, marking the cut with `..`.
pub fn truncate_to_width(text: &str, max_width: u32) -> String {
    let max_chars = (max_width / GLYPH_WIDTH) as usize;
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    if max_chars <= 2 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 2).collect();
    out.push_str("..");
    out
}

/// Glyph bitmap for one character, `GLYPH_WIDTH * GLYPH_HEIGHT` entries of 0/1.
///
/// `rows` is the Spleen glyph (rows of on/off pixels); `None` draws a box.
fn glyph_bitmap<G, R>(rows: Option<G>) -> Vec<u8>
where
    G: Iterator<Item = R>,
    R: Iterator<Item = bool>,
{
    let width = GLYPH_WIDTH as usize;
    let height = GLYPH_HEIGHT as usize;
    let mut bitmap = vec![0u8; width * height];

    match rows {
        Some(spleen_glyph) => {
            for (row_y, row) in spleen_glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < height && col_x < width {
                        bitmap[row_y * width + col_x] = u8::from(on);
                    }
                }
            }
        }
        None => draw_box(&mut bitmap, width, height),
    }

    bitmap
}

/// Outline box for characters the font does not cover.
fn draw_box(bitmap: &mut [u8], width: usize, height: usize) {
    for x in 1..width - 1 {
        bitmap[2 * width + x] = 1;
        bitmap[(height - 3) * width + x] = 1;
    }
    for y in 2..height - 2 {
        bitmap[y * width + 1] = 1;
        bitmap[y * width + width - 2] = 1;
    }
}

/// Draw `text` horizontally centered on `center_x`, top edge at `top`.
///
/// Pixels falling outside the canvas are clipped.
pub fn draw_text_centered(canvas: &mut RgbaImage, text: &str, center_x: i64, top: i64, color: Rgba<u8>) {
    if text.is_empty() {
        return;
    }
    let mut font = PSF2Font::new(FONT_8X16).expect("bundled Spleen 8x16 font is valid");

    let left = center_x - text_width(text) as i64 / 2;
    for (i, ch) in text.chars().enumerate() {
        if ch == ' ' {
            continue;
        }
        let utf8 = ch.to_string();
        let bitmap = glyph_bitmap(font.glyph_for_utf8(utf8.as_bytes()));
        let origin_x = left + i as i64 * GLYPH_WIDTH as i64;
        for gy in 0..GLYPH_HEIGHT as i64 {
            for gx in 0..GLYPH_WIDTH as i64 {
                if bitmap[(gy * GLYPH_WIDTH as i64 + gx) as usize] == 0 {
                    continue;
                }
                let (px, py) = (origin_x + gx, top + gy);
                if px >= 0 && py >= 0 && px < canvas.width() as i64 && py < canvas.height() as i64 {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}
