//! Placeholder QR and barcode artwork
//!
//! These are deterministic pictures derived from a string, not scannable
//! symbologies. The same input always produces the same SVG.

use std::fmt::Write as _;

pub const QR_SIZE: f64 = 100.0;
pub const QR_MODULES: usize = 21;

pub const BARCODE_WIDTH: u32 = 150;
pub const BARCODE_HEIGHT: u32 = 40;
/// Room below the bars for the caption
const BARCODE_CAPTION_SPACE: u32 = 20;

/// Module grid for the QR placeholder; `true` means a dark module
///
/// Module (i, j) is dark when `(unit[(i + j) % len] + i * j)` is odd, where
/// `unit` are the UTF-16 code units of `text`. Empty text gives a blank grid.
pub fn qr_pattern(text: &str) -> Vec<Vec<bool>> {
    let units: Vec<u16> = text.encode_utf16().collect();
    (0..QR_MODULES)
        .map(|i| {
            (0..QR_MODULES)
                .map(|j| {
                    if units.is_empty() {
                        return false;
                    }
                    let unit = units[(i + j) % units.len()] as usize;
                    (unit + i * j) % 2 == 1
                })
                .collect()
        })
        .collect()
}

/// A single vertical bar of the barcode placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    pub x: u32,
    pub width: u32,
}

/// Bars for the barcode placeholder
///
/// Eight slots per code unit, 3 px apart. Slot `i` uses unit
/// `c = unit[i % len]`, has width `2 + c % 3` and is drawn unless
/// `(c + i) % 3 == 0`.
pub fn barcode_bars(text: &str) -> Vec<Bar> {
    let units: Vec<u16> = text.encode_utf16().collect();
    (0..units.len() * 8)
        .filter_map(|i| {
            let unit = units[i % units.len()] as usize;
            if (unit + i) % 3 == 0 {
                return None;
            }
            Some(Bar {
                x: (i * 3) as u32,
                width: 2 + (unit % 3) as u32,
            })
        })
        .collect()
}

/// SVG markup for the QR placeholder
pub fn qr_svg(text: &str) -> String {
    let module = QR_SIZE / QR_MODULES as f64;
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#,
        size = QR_SIZE
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);
    for (i, row) in qr_pattern(text).iter().enumerate() {
        for (j, dark) in row.iter().enumerate() {
            if *dark {
                let _ = writeln!(
                    svg,
                    r#"  <rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="black"/>"#,
                    j as f64 * module,
                    i as f64 * module,
                    module,
                    module
                );
            }
        }
    }
    svg.push_str("</svg>\n");
    svg
}

/// SVG markup for the barcode placeholder, with `text` as caption
pub fn barcode_svg(text: &str) -> String {
    let total_height = BARCODE_HEIGHT + BARCODE_CAPTION_SPACE;
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = BARCODE_WIDTH,
        h = total_height
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);
    for bar in barcode_bars(text) {
        let _ = writeln!(
            svg,
            r#"  <rect x="{}" y="0" width="{}" height="{}" fill="black"/>"#,
            bar.x, bar.width, BARCODE_HEIGHT
        );
    }
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="{}" text-anchor="middle" font-size="8" fill="black">{}</text>"#,
        BARCODE_WIDTH / 2,
        BARCODE_HEIGHT + 15,
        escape_xml(text)
    );
    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
