//! Spanish Text - Spanish language helpers for licence documents
//!
//! This crate provides:
//! - Long Spanish date formatting ("5 de marzo de 2024")
//! - Parsing of numeric and split day/month/year dates
//! - Splitting full names into given name and surnames
//! - File-name sanitising for names and identifiers
//!
//! # Example
//!
//! ```ignore
//! use spanish_text::{parse_numeric_date, format_date, split_full_name};
//!
//! let date = parse_numeric_date("05/03/2024")?;
//! assert_eq!(format_date(date), "5 de marzo de 2024");
//!
//! let name = split_full_name("García, Ana");
//! assert_eq!(name.display_name(), "Ana García");
//! ```

mod filename;
mod formatter;
mod names;

pub use filename::sanitize_file_component;
pub use names::{split_full_name, PersonName};

// Re-export commonly used formatting functions
pub use formatter::{
    format_date, parse_date_parts, parse_numeric_date,
    spanish_month_name, SPANISH_MONTHS,
};

use thiserror::Error;

/// Errors that can occur during Spanish text processing
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for Spanish text operations
pub type Result<T> = std::result::Result<T, TextError>;
