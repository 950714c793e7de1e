//! Label PDF - low-level PDF writer for label pages
//!
//! This crate provides functionality for:
//! - Creating documents with pages of arbitrary size (in points)
//! - Embedding TrueType fonts, or falling back to built-in Helvetica
//! - Inserting text at top-origin coordinates with alignment
//! - Inserting PNG images and stroking rectangles
//!
//! # Example
//!
//! ```ignore
//! use label_pdf::{Align, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_page(283.46, 226.77)?;
//! doc.set_font_size(11.0);
//! doc.insert_text("Shipping Label", page, 141.7, 20.0, Align::Center)?;
//! doc.save("label.pdf")?;
//! ```

mod document;
mod font;
mod image;
mod text;

pub use document::PdfDocument;
pub use font::{BuiltinFont, FontData, FontFamily, FontFamilyBuilder, FontWeight};
pub use image::{calculate_scaled_dimensions, ImageScaleMode};
pub use text::{generate_rect_operators, generate_text_operators, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Invalid page size: {0} x {1} pt")]
    InvalidPageSize(f64, f64),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
