//! Label Template - shipping label templates, rendering and export
//!
//! This crate provides:
//! - The order [`Record`] with raw and display value projections
//! - Label template schema types and a validating JSON loader
//! - The built-in template catalog
//! - The render engine producing renderer-agnostic [`RenderCommand`]s
//! - Code 128 / QR image generation
//! - A shared millimetre layout consumed by the PDF exporter and the preview
//!
//! # Example
//!
//! ```ignore
//! use label_template::{BarcodeGenerator, FieldKey, PdfExporter, Record, TemplateCatalog};
//!
//! let catalog = TemplateCatalog::builtin()?;
//! let template = catalog.by_code("QW075551-2").unwrap();
//! let record = Record::new()
//!     .with(FieldKey::Cscustpo, "PO-1001")
//!     .with(FieldKey::Erpmat, "4D010018")
//!     .with(FieldKey::Ogd09, "6733");
//!
//! let generator = BarcodeGenerator;
//! let pdf_bytes = PdfExporter::new(&generator).export_single(template, &record)?;
//! ```

mod barcode;
mod catalog;
mod command;
mod config;
mod export;
pub mod layout;
pub mod parser;
mod preview;
mod record;
mod renderer;
mod schema;
pub mod units;

pub use barcode::{BarcodeGenerator, SymbolGenerator};
pub use catalog::TemplateCatalog;
pub use command::{CommandBatch, CommandKind, RenderCommand, TextRun, COMMAND_FORMAT_VERSION};
pub use config::{ExportConfig, FitConfig, LabelConfig};
pub use export::{batch_file_name, default_file_name, PdfExporter, DEFAULT_OUTPUT_DIR};
pub use layout::{BuiltinMetrics, EstimatedMetrics, LayoutItem, TextMeasure};
pub use parser::{parse_template, CombinePart, CombinePattern};
pub use preview::{PreviewCanvas, PreviewElement, PreviewLine, PreviewRenderer};
pub use record::{FieldKey, Record};
pub use renderer::LabelRenderer;
pub use schema::*;

use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse template: {0}")]
    ParseError(String),

    #[error("Invalid template: {0}")]
    ValidationError(String),

    #[error("Barcode error: {0}")]
    Barcode(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] label_pdf::PdfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for TemplateError {
    fn from(err: image::ImageError) -> Self {
        TemplateError::ImageError(err.to_string())
    }
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
