//! Generator: runs the whole pipeline for one source form

use crate::catalog::{CatalogLoader, Selection};
use crate::certificate::{certificate_file_name, CertificateRenderer};
use crate::config::GeneratorConfig;
use crate::fields::FieldStore;
use crate::form::{mutated_file_name, FormMutator};
use crate::record::FormRecord;
use crate::roster::{roster_file_name, RosterReporter};
use crate::{LicenciaError, Result};
use chrono::{Local, NaiveDateTime};
use pdf_core::PdfDocument;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory names tried per timestamp before giving up
const MAX_RUN_DIR_ATTEMPTS: usize = 100;

/// What to generate
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Filled practice form
    pub source: PathBuf,
    /// Catalog entries to write over the form values
    pub selection: Selection,
}

/// Result of writing one output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    Written {
        path: PathBuf,
        /// Form keys printed as blanks
        #[serde(skip_serializing_if = "Vec::is_empty")]
        missing_fields: Vec<String>,
    },
    Failed {
        path: PathBuf,
        reason: String,
    },
}

impl ArtifactOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ArtifactOutcome::Written { path, .. } | ArtifactOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, ArtifactOutcome::Written { .. })
    }
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Directory created for this run
    pub output_dir: PathBuf,
    /// Students found on the form
    pub students: usize,
    /// One outcome per student, in form order
    pub certificates: Vec<ArtifactOutcome>,
    pub form: ArtifactOutcome,
    pub roster: ArtifactOutcome,
    /// Problems that did not stop the run
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn certificates_produced(&self) -> usize {
        self.certificates.iter().filter(|c| c.is_written()).count()
    }

    /// Whether every artifact was written
    pub fn is_complete(&self) -> bool {
        self.form.is_written()
            && self.roster.is_written()
            && self.certificates.iter().all(ArtifactOutcome::is_written)
    }
}

/// Licence document generator
pub struct Generator<L: CatalogLoader> {
    config: GeneratorConfig,
    catalog: L,
}

impl<L: CatalogLoader> Generator<L> {
    pub fn new(config: GeneratorConfig, catalog: L) -> Self {
        Self { config, catalog }
    }

    /// Run the pipeline, stamping outputs with the local time
    pub fn run(&self, request: &GenerationRequest) -> Result<RunReport> {
        self.run_at(request, Local::now().naive_local())
    }

    /// Run the pipeline with an explicit timestamp
    ///
    /// Only an unreadable source or an output root that cannot hold a new
    /// run directory abort the run; every other failure is recorded in the
    /// report and the remaining artifacts are still produced.
    pub fn run_at(&self, request: &GenerationRequest, now: NaiveDateTime) -> Result<RunReport> {
        let source = read_source(&request.source)?;
        let mut fields = {
            let doc = PdfDocument::open_from_bytes(&source).map_err(|e| {
                LicenciaError::SourceUnreadable {
                    path: request.source.clone(),
                    reason: e.to_string(),
                }
            })?;
            FieldStore::from_document(&doc)?
        };

        let mut warnings = Vec::new();
        let overrides = self.selection_overrides(&request.selection, &mut warnings);
        fields.merge(&overrides);

        let record = FormRecord::parse(&fields);
        if record.students.is_empty() {
            warnings.push("No students found on the form".to_string());
        }

        let timestamp = now.format("%Y%m%d_%H%M%S").to_string();
        let output_dir = create_run_dir(&self.config.output_root, &timestamp)?;
        tracing::info!(
            dir = %output_dir.display(),
            students = record.students.len(),
            "Generating licence documents"
        );

        let certificates = self.write_certificates(&record, &output_dir.join("PDFs"));

        let form_path = output_dir.join(mutated_file_name(&request.source, &timestamp));
        let form = outcome(
            "form",
            form_path,
            FormMutator::mutate(&source, &overrides).map(|m| (m.bytes, Vec::new())),
        );

        let roster_path = output_dir.join(roster_file_name(&timestamp));
        let roster = outcome(
            "roster",
            roster_path,
            RosterReporter::render(&record.students, &record.trip).map(|b| (b, Vec::new())),
        );

        let report = RunReport {
            output_dir,
            students: record.students.len(),
            certificates,
            form,
            roster,
            warnings,
        };
        tracing::info!(
            certificates = report.certificates_produced(),
            failed = report.certificates.len() - report.certificates_produced(),
            "Run finished"
        );
        Ok(report)
    }

    /// Overrides for the selected catalog entries
    ///
    /// The catalog is only read when something was selected. Any problem
    /// becomes a warning and the affected overrides are skipped.
    fn selection_overrides(
        &self,
        selection: &Selection,
        warnings: &mut Vec<String>,
    ) -> BTreeMap<String, String> {
        if selection.is_empty() {
            return BTreeMap::new();
        }

        let catalog = match self.catalog.load() {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(error = %e, "Catalog unavailable, keeping form values");
                warnings.push(e.to_string());
                return BTreeMap::new();
            }
        };

        let (overrides, problems) = selection.resolve(&catalog);
        for problem in problems {
            tracing::warn!(error = %problem, "Selection skipped");
            warnings.push(problem.to_string());
        }
        overrides
    }

    fn write_certificates(&self, record: &FormRecord, pdf_dir: &Path) -> Vec<ArtifactOutcome> {
        let logo = self.config.logo_bytes();
        let mut renderer = CertificateRenderer::new(&self.config.issuer);
        if let Some(logo) = logo.as_deref() {
            renderer = renderer.with_logo(logo);
        }

        let mut used = HashSet::new();
        record
            .students
            .iter()
            .map(|student| {
                let path = pdf_dir.join(unique_name(certificate_file_name(student), &mut used));
                let rendered = renderer
                    .render(student, &record.trip)
                    .map(|c| (c.bytes, c.missing_fields));
                outcome("certificate", path, rendered)
            })
            .collect()
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| LicenciaError::SourceUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write rendered bytes and turn the result into an outcome
fn outcome(
    kind: &str,
    path: PathBuf,
    rendered: Result<(Vec<u8>, Vec<String>)>,
) -> ArtifactOutcome {
    let written = rendered.and_then(|(bytes, missing)| {
        write_artifact(&path, &bytes)?;
        Ok(missing)
    });

    match written {
        Ok(missing_fields) => {
            tracing::info!(kind, path = %path.display(), "Written");
            ArtifactOutcome::Written {
                path,
                missing_fields,
            }
        }
        Err(e) => {
            tracing::warn!(kind, path = %path.display(), error = %e, "Failed");
            ArtifactOutcome::Failed {
                path,
                reason: e.to_string(),
            }
        }
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// `name` or, when already used in this run, `name` with `_2`, `_3`... before the extension
fn unique_name(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
        None => (name.clone(), String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}_{n}{extension}");
        if used.insert(candidate.clone()) {
            tracing::warn!(file = %name, renamed = %candidate, "Duplicate student, certificate renamed");
            return candidate;
        }
        n += 1;
    }
}

/// Create `<root>/<timestamp>`, or `<timestamp>_2`, `_3`... when taken
pub fn create_run_dir(root: &Path, timestamp: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(root)?;

    for attempt in 1..=MAX_RUN_DIR_ATTEMPTS {
        let name = match attempt {
            1 => timestamp.to_string(),
            n => format!("{timestamp}_{n}"),
        };
        let dir = root.join(name);
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(LicenciaError::Io(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free run directory for {timestamp} under {}", root.display()),
    )))
}
