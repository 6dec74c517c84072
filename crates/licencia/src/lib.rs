//! Licencia - navigation licence documents from a filled practice form
//!
//! This crate provides:
//! - Field Store ingestion from an AcroForm PDF
//! - Student extraction from the `D_{n}` / `D_{n+1}` pairs
//! - Reference catalog (instructors, vessels) behind a loader trait
//! - Certificate, mutated-form and roster rendering
//! - A generator that runs the whole pipeline and reports per-artifact outcomes
//!
//! # Example
//!
//! ```ignore
//! use licencia::{GenerationRequest, Generator, GeneratorConfig, JsonCatalogFile, Selection};
//!
//! let generator = Generator::new(GeneratorConfig::default(), JsonCatalogFile::new("catalogo.json"));
//! let report = generator.run(&GenerationRequest {
//!     source: "practicas.pdf".into(),
//!     selection: Selection::new(Some("Juan Pérez"), Some("AB-1234")),
//! })?;
//! println!("{} certificados en {}", report.certificates_produced(), report.output_dir.display());
//! ```

pub mod catalog;
pub mod certificate;
pub mod config;
pub mod fields;
pub mod form;
pub mod generator;
pub mod record;
pub mod roster;
pub mod students;

pub use catalog::{Catalog, CatalogLoader, Instructor, JsonCatalogFile, Selection, StaticCatalog, Vessel};
pub use certificate::{CertificateRenderer, RenderedCertificate};
pub use config::{GeneratorConfig, IssuerConfig};
pub use fields::FieldStore;
pub use form::{FormMutator, MutatedForm};
pub use generator::{ArtifactOutcome, GenerationRequest, Generator, RunReport};
pub use record::{FormRecord, TripMetadata};
pub use roster::RosterReporter;
pub use students::{extract_students, Student};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while producing licence documents
#[derive(Debug, Error)]
pub enum LicenciaError {
    #[error("Cannot read source form {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("Source form has no fillable fields")]
    NoFormFields,

    #[error("Reference catalog error: {0}")]
    Catalog(String),

    #[error("Unknown instructor: {0}")]
    UnknownInstructor(String),

    #[error("Unknown vessel: {0}")]
    UnknownVessel(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("{0}")]
    InvalidDate(#[from] spanish_text::TextError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for licence operations
pub type Result<T> = std::result::Result<T, LicenciaError>;
