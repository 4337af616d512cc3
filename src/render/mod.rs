//! Rendering - placeholder code artwork and printable documents

pub mod codes;
pub mod document;

pub use codes::{barcode_svg, qr_svg};
pub use document::{render_gate_pass, DocumentHeader};
