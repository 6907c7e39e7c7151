//! Batch sheets: many payloads, one grid.
//!
//! Input is free text, one code per line. A comma splits an optional label
//! from the value (`Site,https://example.com`); lines without a comma use
//! the whole line as the value. Values are encoded verbatim.

use image::{RgbaImage, imageops};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::error::QrDeckError;
use crate::render::engine::{EncodeParams, ModuleGrid, QrEngine, QrMatrix};
use crate::render::font::{self, GLYPH_HEIGHT};
use crate::render::raster::{self, RasterStyle};
use crate::render::svg::{escape_xml, svg_body, view_size};
use crate::render::{ErrorLevel, HexColor};

/// Space around each QR inside its grid cell, in pixels.
const CELL_PADDING: u32 = 16;
/// Height reserved under each QR for its label.
const LABEL_ROW: u32 = 24;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchLine {
    pub label: String,
    pub value: String,
}

impl BatchLine {
    /// The label, or the raw value when no label was given.
    pub fn caption(&self) -> &str {
        if self.label.is_empty() {
            &self.value
        } else {
            &self.label
        }
    }
}

/// Parse batch input. Blank lines are dropped; the first comma splits
/// label from value.
pub fn parse_batch_lines(text: &str) -> Vec<BatchLine> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(',') {
            Some((label, value)) => BatchLine {
                label: label.trim().to_string(),
                value: value.trim().to_string(),
            },
            None => BatchLine {
                label: String::new(),
                value: line.to_string(),
            },
        })
        .collect()
}

fn default_quiet_zone() -> u32 {
    4
}

fn default_columns() -> u32 {
    4
}

fn default_cell() -> u32 {
    6
}

/// Options shared by every code on a batch sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    #[serde(default)]
    pub ecc: ErrorLevel,
    #[serde(default = "default_quiet_zone")]
    pub quiet_zone: u32,
    #[serde(default = "default_columns")]
    pub columns: u32,
    /// Pixels per module
    #[serde(default = "default_cell")]
    pub cell: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            ecc: ErrorLevel::M,
            quiet_zone: default_quiet_zone(),
            columns: default_columns(),
            cell: default_cell(),
        }
    }
}

impl BatchOptions {
    /// Clamp into the ranges the batch form allows.
    pub fn clamped(self) -> Self {
        Self {
            ecc: self.ecc,
            quiet_zone: self.quiet_zone.min(12),
            columns: self.columns.clamp(2, 8),
            cell: self.cell.clamp(2, 20),
        }
    }
}

/// A rendered batch sheet.
#[derive(Debug, Clone)]
pub struct BatchSheet {
    pub lines: Vec<BatchLine>,
    pub ecc: ErrorLevel,
    pub svg: String,
    pub raster: RgbaImage,
    /// e.g. `3 codes · ECC M`
    pub meta: String,
}

impl BatchSheet {
    /// Number of codes on the sheet.
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    pub fn png(&self) -> Result<Vec<u8>, QrDeckError> {
        raster::encode_png(&self.raster)
    }
}

/// Cell geometry shared by the SVG and raster sheets.
struct SheetLayout {
    columns: u32,
    cell_width: u32,
    cell_height: u32,
    width: u32,
    height: u32,
}

impl SheetLayout {
    fn new(count: usize, columns: u32, max_side: u32) -> Self {
        let rows = (count as u32).div_ceil(columns);
        let cell_width = max_side + CELL_PADDING;
        let cell_height = max_side + CELL_PADDING + LABEL_ROW;
        Self {
            columns,
            cell_width,
            cell_height,
            width: columns * cell_width,
            height: rows * cell_height,
        }
    }

    /// Top-left of the QR in cell `index` (row-major), QR centered horizontally.
    fn qr_origin(&self, index: usize, side: u32) -> (u32, u32) {
        let col = index as u32 % self.columns;
        let row = index as u32 / self.columns;
        let x = col * self.cell_width + (self.cell_width - side) / 2;
        let y = row * self.cell_height + CELL_PADDING / 2;
        (x, y)
    }

    fn cell_center_x(&self, index: usize) -> u32 {
        (index as u32 % self.columns) * self.cell_width + self.cell_width / 2
    }
}

/// Render every line of `text` and lay the codes out on one sheet.
pub fn build_batch(
    engine: &dyn QrEngine,
    text: &str,
    options: &BatchOptions,
) -> Result<BatchSheet, QrDeckError> {
    let options = options.clamped();
    let lines = parse_batch_lines(text);
    if lines.is_empty() {
        return Err(QrDeckError::EmptyPayload("enter at least one line".to_string()));
    }

    let params = EncodeParams {
        ecc: options.ecc,
        ..Default::default()
    };
    let grids: Vec<QrMatrix> = lines
        .par_iter()
        .map(|line| {
            engine.generate(&line.value, &params).inspect_err(|e| {
                log::warn!("batch line '{}' failed: {}", line.caption(), e);
            })
        })
        .collect::<Result<_, _>>()?;

    let style = RasterStyle::monochrome(options.cell, options.quiet_zone);
    let sides = grids
        .iter()
        .map(|grid| {
            style.side_for(grid.module_count()).ok_or_else(|| {
                QrDeckError::SurfaceUnavailable("batch cell size overflows".to_string())
            })
        })
        .collect::<Result<Vec<u32>, _>>()?;
    let max_side = sides.iter().copied().max().unwrap_or(0);
    let layout = SheetLayout::new(lines.len(), options.columns, max_side);

    let raster = render_sheet_raster(&lines, &grids, &sides, &layout, &style)?;
    let svg = render_sheet_svg(&lines, &grids, &sides, &layout, options.quiet_zone);
    let meta = format!("{} codes · ECC {}", lines.len(), options.ecc);

    Ok(BatchSheet {
        lines,
        ecc: options.ecc,
        svg,
        raster,
        meta,
    })
}

fn render_sheet_raster(
    lines: &[BatchLine],
    grids: &[QrMatrix],
    sides: &[u32],
    layout: &SheetLayout,
    style: &RasterStyle,
) -> Result<RgbaImage, QrDeckError> {
    let mut sheet = raster::allocate_surface(layout.width, layout.height, HexColor::WHITE.to_rgba())?;
    let ink = HexColor::BLACK.to_rgba();

    for (index, (line, grid)) in lines.iter().zip(grids).enumerate() {
        let qr = raster::render_raster(grid, style)?;
        let (x, y) = layout.qr_origin(index, sides[index]);
        imageops::replace(&mut sheet, &qr, x as i64, y as i64);

        let caption = font::truncate_to_width(line.caption(), layout.cell_width - 4);
        let label_top = y + sides[index] + (LABEL_ROW - GLYPH_HEIGHT) / 2;
        font::draw_text_centered(
            &mut sheet,
            &caption,
            layout.cell_center_x(index) as i64,
            label_top as i64,
            ink,
        );
    }

    Ok(sheet)
}

fn render_sheet_svg(
    lines: &[BatchLine],
    grids: &[QrMatrix],
    sides: &[u32],
    layout: &SheetLayout,
    quiet_zone: u32,
) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\
         <rect width=\"100%\" height=\"100%\" fill=\"{bg}\"/>",
        w = layout.width,
        h = layout.height,
        bg = HexColor::WHITE,
    );

    for (index, (line, grid)) in lines.iter().zip(grids).enumerate() {
        let side = sides[index];
        let (x, y) = layout.qr_origin(index, side);
        let dim = view_size(grid, quiet_zone);
        // Writing to a String cannot fail
        let _ = write!(
            svg,
            "<svg x=\"{x}\" y=\"{y}\" width=\"{side}\" height=\"{side}\" viewBox=\"0 0 {dim} {dim}\" shape-rendering=\"crispEdges\">{}</svg>",
            svg_body(grid, quiet_zone, HexColor::BLACK, HexColor::WHITE),
        );
        let _ = write!(
            svg,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"14\" fill=\"{}\">{}</text>",
            layout.cell_center_x(index),
            y + side + LABEL_ROW - 6,
            HexColor::BLACK,
            escape_xml(line.caption()),
        );
    }

    svg.push_str("</svg>");
    svg
}
