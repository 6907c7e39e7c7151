//! SVG output.
//!
//! One background rect and one path holding every dark module. The viewBox is
//! measured in modules, so the document scales to any size without blurring.

use std::fmt::Write;

use super::HexColor;
use super::engine::ModuleGrid;

/// Build the path data for all dark modules, offset by `quiet_zone` modules.
pub fn module_path(grid: &dyn ModuleGrid, quiet_zone: u32) -> String {
    let count = grid.module_count();
    let offset = quiet_zone as usize;
    let mut path = String::new();
    for row in 0..count {
        for col in 0..count {
            if !grid.is_dark(row, col) {
                continue;
            }
            // Writing to a String cannot fail
            let _ = write!(path, "M{} {}h1v1h-1z", col + offset, row + offset);
        }
    }
    path
}

/// Side length of the viewBox, in modules.
pub fn view_size(grid: &dyn ModuleGrid, quiet_zone: u32) -> usize {
    grid.module_count() + 2 * quiet_zone as usize
}

/// Inner markup (background rect + module path) shared by standalone and
/// embedded QR documents.
pub fn svg_body(grid: &dyn ModuleGrid, quiet_zone: u32, fg: HexColor, bg: HexColor) -> String {
    format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/><path d=\"{}\" fill=\"{}\"/>",
        bg,
        module_path(grid, quiet_zone),
        fg
    )
}

/// Build a standalone SVG document.
pub fn build_svg(grid: &dyn ModuleGrid, quiet_zone: u32, fg: HexColor, bg: HexColor) -> String {
    let dim = view_size(grid, quiet_zone);
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {dim} {dim}\" shape-rendering=\"crispEdges\">{}</svg>",
        svg_body(grid, quiet_zone, fg, bg)
    )
}

/// Escape text for use in SVG character data or attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::engine::QrMatrix;
    use pretty_assertions::assert_eq;

    fn diagonal() -> QrMatrix {
        QrMatrix::new(2, vec![true, false, false, true]).unwrap()
    }

    #[test]
    fn test_exact_markup() {
        let svg = build_svg(&diagonal(), 1, HexColor::BLACK, HexColor::WHITE);
        assert_eq!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 4 4\" shape-rendering=\"crispEdges\">\
             <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\
             <path d=\"M1 1h1v1h-1zM2 2h1v1h-1z\" fill=\"#000000\"/></svg>"
        );
    }

    #[test]
    fn test_background_before_path() {
        let svg = build_svg(&diagonal(), 0, HexColor::INK, HexColor::WHITE);
        let rect = svg.find("<rect").unwrap();
        let path = svg.find("<path").unwrap();
        assert!(rect < path);
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn test_zero_quiet_zone() {
        assert_eq!(module_path(&diagonal(), 0), "M0 0h1v1h-1zM1 1h1v1h-1z");
        assert_eq!(view_size(&diagonal(), 0), 2);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("A&B <\"x\">"), "A&amp;B &lt;&quot;x&quot;&gt;");
    }
}
