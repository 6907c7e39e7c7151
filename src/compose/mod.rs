//! # Batch and Merge Composer
//!
//! Lays several QR codes out on one sheet.
//!
//! - [`batch`]: one QR per input line (`label,value`), rendered with shared
//!   options into an N-column grid
//! - [`merge`]: 2-4 QR images the user already has (payment codes, links...),
//!   placed in a fixed 2-column grid with labels
//!
//! Both produce a raster sheet and an SVG document from the same pass.

pub mod batch;
pub mod merge;

pub use batch::{BatchLine, BatchOptions, BatchSheet, build_batch, parse_batch_lines};
pub use merge::{MAX_MERGE_ITEMS, MIN_MERGE_ITEMS, MergeItem, MergeList, MergedGrid, load_image};
