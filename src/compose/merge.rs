//! Merged grids of existing QR images.
//!
//! The list holds 2-4 uploaded images. Generation places each one in a fixed
//! 200px footprint on a 2-column grid with a label row underneath:
//!
//! ```text
//! ┌──────────────┬──────────────┐
//! │   [QR 200]   │   [QR 200]   │
//! │    label     │    label     │
//! ├──────────────┼──────────────┤
//! │   [QR 200]   │   [QR 200]   │
//! │    label     │    label     │
//! └──────────────┴──────────────┘
//! ```
//!
//! The PNG carries bitmap labels. The SVG embeds the label-less raster and
//! overlays the labels as `<text>`, so both come from one generation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::QrDeckError;
use crate::render::font::{self, GLYPH_HEIGHT};
use crate::render::raster;
use crate::render::svg::escape_xml;
use crate::render::HexColor;

/// Fewest images that can be merged.
pub const MIN_MERGE_ITEMS: usize = 2;
/// Most images the list accepts.
pub const MAX_MERGE_ITEMS: usize = 4;

/// Side of each QR footprint, in pixels.
pub const MERGE_QR_SIZE: u32 = 200;
/// Gap around each footprint (half on each side).
pub const MERGE_PADDING: u32 = 20;
/// Label row beneath each footprint.
pub const MERGE_LABEL_ROW: u32 = 24;
pub const MERGE_COLUMNS: u32 = 2;

/// One uploaded image waiting to be merged.
#[derive(Debug, Clone)]
pub struct MergeItem {
    pub id: Uuid,
    pub image: Arc<DynamicImage>,
    /// May be empty; generation falls back to `QR {n}`.
    pub label: String,
}

impl MergeItem {
    /// JSON-friendly view without the pixels.
    pub fn info(&self) -> MergeItemInfo {
        MergeItemInfo {
            id: self.id,
            label: self.label.clone(),
            width: self.image.width(),
            height: self.image.height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeItemInfo {
    pub id: Uuid,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// Output of [`MergeList::generate`].
#[derive(Debug, Clone)]
pub struct MergedGrid {
    /// Composite with bitmap labels
    pub raster: RgbaImage,
    /// SVG wrapper: embedded raster plus `<text>` labels
    pub svg: String,
}

impl MergedGrid {
    pub fn png(&self) -> Result<Vec<u8>, QrDeckError> {
        raster::encode_png(&self.raster)
    }
}

/// Ordered list of images to merge. Insertion order is grid order.
#[derive(Debug, Clone, Default)]
pub struct MergeList {
    items: Vec<MergeItem>,
}

/// Decode uploaded image bytes (PNG, JPEG, ...).
pub fn load_image(bytes: &[u8]) -> Result<DynamicImage, QrDeckError> {
    image::load_from_memory(bytes).map_err(|e| QrDeckError::Image(format!("invalid image: {}", e)))
}

impl MergeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-decoded image.
    ///
    /// Fails with [`QrDeckError::TooManyCodes`] when the list is full; the
    /// list is left unchanged.
    pub fn add(&mut self, image: DynamicImage, label: impl Into<String>) -> Result<Uuid, QrDeckError> {
        if self.is_full() {
            log::info!("merge list full, rejecting upload");
            return Err(QrDeckError::TooManyCodes { max: MAX_MERGE_ITEMS });
        }
        let id = Uuid::new_v4();
        self.items.push(MergeItem {
            id,
            image: Arc::new(image),
            label: label.into(),
        });
        log::debug!("merge item {} added ({} in list)", id, self.items.len());
        Ok(id)
    }

    /// Decode raw image bytes (PNG, JPEG, ...) and append them.
    ///
    /// Capacity is checked before decoding; undecodable bytes never enter
    /// the list.
    pub fn add_encoded(&mut self, bytes: &[u8], label: impl Into<String>) -> Result<Uuid, QrDeckError> {
        if self.is_full() {
            return Err(QrDeckError::TooManyCodes { max: MAX_MERGE_ITEMS });
        }
        self.add(load_image(bytes)?, label)
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_MERGE_ITEMS
    }

    pub fn remove(&mut self, id: Uuid) -> Result<MergeItem, QrDeckError> {
        let index = self.position(id)?;
        log::debug!("merge item {} removed", id);
        Ok(self.items.remove(index))
    }

    pub fn set_label(&mut self, id: Uuid, label: impl Into<String>) -> Result<(), QrDeckError> {
        let index = self.position(id)?;
        self.items[index].label = label.into();
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<&MergeItem, QrDeckError> {
        self.position(id).map(|index| &self.items[index])
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[MergeItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn can_generate(&self) -> bool {
        self.items.len() >= MIN_MERGE_ITEMS
    }

    fn position(&self, id: Uuid) -> Result<usize, QrDeckError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| QrDeckError::UnknownItem(id.to_string()))
    }

    /// Compose the merged grid.
    ///
    /// Fails with [`QrDeckError::NotEnoughCodes`] below two images.
    pub fn generate(&self) -> Result<MergedGrid, QrDeckError> {
        if !self.can_generate() {
            return Err(QrDeckError::NotEnoughCodes {
                min: MIN_MERGE_ITEMS,
                actual: self.items.len(),
            });
        }

        let cell_w = MERGE_QR_SIZE + MERGE_PADDING;
        let cell_h = MERGE_QR_SIZE + MERGE_PADDING + MERGE_LABEL_ROW;
        let rows = (self.items.len() as u32).div_ceil(MERGE_COLUMNS);
        let width = MERGE_COLUMNS * cell_w;
        let height = rows * cell_h;

        let mut layer = raster::allocate_surface(width, height, HexColor::WHITE.to_rgba())?;
        let mut labels = Vec::with_capacity(self.items.len());

        for (index, item) in self.items.iter().enumerate() {
            let col = index as u32 % MERGE_COLUMNS;
            let row = index as u32 / MERGE_COLUMNS;
            let x = col * cell_w + MERGE_PADDING / 2;
            let y = row * cell_h + MERGE_PADDING / 2;

            let scaled = imageops::resize(
                &item.image.to_rgba8(),
                MERGE_QR_SIZE,
                MERGE_QR_SIZE,
                FilterType::Triangle,
            );
            imageops::overlay(&mut layer, &scaled, x as i64, y as i64);

            let label = match item.label.trim() {
                "" => format!("QR {}", index + 1),
                text => text.to_string(),
            };
            labels.push((x + MERGE_QR_SIZE / 2, y + MERGE_QR_SIZE, label));
        }

        let svg = merged_svg(&layer, width, height, &labels)?;

        let mut raster = layer;
        let ink = HexColor::BLACK.to_rgba();
        for (center_x, qr_bottom, label) in &labels {
            let text = font::truncate_to_width(label, cell_w - 4);
            let top = qr_bottom + (MERGE_LABEL_ROW - GLYPH_HEIGHT) / 2;
            font::draw_text_centered(&mut raster, &text, *center_x as i64, top as i64, ink);
        }

        log::info!("merged {} codes into {}x{} grid", self.items.len(), width, height);
        Ok(MergedGrid { raster, svg })
    }
}

fn merged_svg(
    layer: &RgbaImage,
    width: u32,
    height: u32,
    labels: &[(u32, u32, String)],
) -> Result<String, QrDeckError> {
    let png = raster::encode_png(layer)?;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\
         <image href=\"data:image/png;base64,{}\" x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\"/>",
        BASE64.encode(&png),
        w = width,
        h = height,
    );
    for (center_x, qr_bottom, label) in labels {
        // Writing to a String cannot fail
        let _ = write!(
            svg,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"16\" font-weight=\"bold\" fill=\"{}\">{}</text>",
            center_x,
            qr_bottom + MERGE_LABEL_ROW - 6,
            HexColor::BLACK,
            escape_xml(label),
        );
    }
    svg.push_str("</svg>");
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn square(color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 50, Rgba(color)))
    }

    fn list_of(n: usize) -> MergeList {
        let mut list = MergeList::new();
        for _ in 0..n {
            list.add(square([0, 0, 0, 255]), "").unwrap();
        }
        list
    }

    #[test]
    fn test_capacity() {
        let mut list = list_of(4);
        let err = list.add(square([0, 0, 0, 255]), "fifth").unwrap_err();
        assert!(matches!(err, QrDeckError::TooManyCodes { max: 4 }));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_not_enough_codes() {
        let list = list_of(1);
        assert!(!list.can_generate());
        let err = list.generate().unwrap_err();
        assert!(matches!(err, QrDeckError::NotEnoughCodes { min: 2, actual: 1 }));
    }

    #[test]
    fn test_invalid_upload_never_enters_list() {
        let mut list = MergeList::new();
        let err = list.add_encoded(b"not an image", "x").unwrap_err();
        assert!(matches!(err, QrDeckError::Image(_)));
        assert!(list.is_empty());
    }

    #[test]
    fn test_add_encoded_png() {
        let mut list = MergeList::new();
        let png = raster::encode_png(&RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]))).unwrap();
        let id = list.add_encoded(&png, "scan me").unwrap();
        assert_eq!(list.get(id).unwrap().info().width, 8);
        assert_eq!(list.get(id).unwrap().label, "scan me");
    }

    #[test]
    fn test_label_and_remove() {
        let mut list = list_of(3);
        let id = list.items()[1].id;
        list.set_label(id, "Pay").unwrap();
        assert_eq!(list.items()[1].label, "Pay");

        list.remove(id).unwrap();
        assert_eq!(list.len(), 2);
        assert!(matches!(list.remove(id), Err(QrDeckError::UnknownItem(_))));
        assert!(list.set_label(Uuid::new_v4(), "x").is_err());

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_grid_dimensions() {
        let grid = list_of(3).generate().unwrap();
        // 2 columns of 220px, 2 rows of 244px
        assert_eq!(grid.raster.dimensions(), (440, 488));

        let grid = list_of(2).generate().unwrap();
        assert_eq!(grid.raster.dimensions(), (440, 244));
    }

    #[test]
    fn test_placement_row_major() {
        let mut list = MergeList::new();
        list.add(square([255, 0, 0, 255]), "").unwrap();
        list.add(square([0, 0, 255, 255]), "").unwrap();
        list.add(square([0, 255, 0, 255]), "").unwrap();
        let grid = list.generate().unwrap();

        assert_eq!(*grid.raster.get_pixel(110, 110), Rgba([255, 0, 0, 255]));
        assert_eq!(*grid.raster.get_pixel(330, 110), Rgba([0, 0, 255, 255]));
        assert_eq!(*grid.raster.get_pixel(110, 354), Rgba([0, 255, 0, 255]));
        // Empty fourth cell stays white
        assert_eq!(*grid.raster.get_pixel(330, 354), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_default_labels_in_svg() {
        let mut list = list_of(2);
        let id = list.items()[0].id;
        list.set_label(id, "  Tips & thanks ").unwrap();
        let grid = list.generate().unwrap();

        assert!(grid.svg.contains("data:image/png;base64,"));
        assert!(grid.svg.contains(">Tips &amp; thanks</text>"));
        assert!(grid.svg.contains(">QR 2</text>"));
        let image = grid.svg.find("<image").unwrap();
        let text = grid.svg.find("<text").unwrap();
        assert!(image < text);
    }
}
