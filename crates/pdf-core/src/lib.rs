//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Opening, creating and saving PDF documents
//! - Reading and writing AcroForm text fields
//! - Inserting text with the standard Helvetica faces (WinAnsi encoding)
//! - Drawing ruled lines and filled rectangles
//! - Inserting images (JPEG, PNG)
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PdfDocument, StandardFont, A4_HEIGHT, A4_WIDTH};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_page(A4_WIDTH, A4_HEIGHT)?;
//! doc.set_font(StandardFont::HelveticaBold, 16.0);
//! doc.insert_text("LICENCIA DE NAVEGACIÓN", page, A4_WIDTH / 2.0, 120.0, Align::Center)?;
//! doc.save("certificado.pdf")?;
//! ```

mod document;
mod font;
mod form;
mod image;
mod text;

pub use document::{Color, PdfDocument};
pub use font::{
    decode_text_string, decode_win_ansi, encode_text_string, encode_win_ansi,
    unsupported_win_ansi, StandardFont,
};
pub use form::{FieldRect, FormField};
pub use image::ImageScaleMode;
pub use text::{generate_text_operators, wrap_runs, TextRenderContext, TextRun};

use thiserror::Error;

/// A4 page width in points
pub const A4_WIDTH: f64 = 595.28;

/// A4 page height in points
pub const A4_HEIGHT: f64 = 841.89;

/// Points per millimetre
pub const MM: f64 = 72.0 / 25.4;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("Form error: {0}")]
    FormError(String),

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
