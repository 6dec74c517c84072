//! Form Mutator: a copy of the source form with selected values replaced

use crate::record::RECOGNISED_KEYS;
use crate::Result;
use pdf_core::PdfDocument;
use std::collections::BTreeMap;
use std::path::Path;

/// The rewritten form
#[derive(Debug, Clone)]
pub struct MutatedForm {
    pub bytes: Vec<u8>,
    /// Logical keys whose field received a new value
    pub changed: Vec<String>,
}

/// Writes override values into the fields of a form
pub struct FormMutator;

impl FormMutator {
    /// Physical field name for a logical key, e.g. `A_INSTR` -> `A_INSTR[0]`
    pub fn physical_name(logical: &str) -> Option<String> {
        RECOGNISED_KEYS
            .contains(&logical)
            .then(|| format!("{logical}[0]"))
    }

    /// Copy `source` with the overrides applied
    ///
    /// Keys without a mapping and fields the form does not have are skipped.
    /// Everything else is written back as loaded; the source bytes are never
    /// touched.
    pub fn mutate(source: &[u8], overrides: &BTreeMap<String, String>) -> Result<MutatedForm> {
        let mut doc = PdfDocument::open_from_bytes(source)?;
        let mut changed = Vec::new();

        for (logical, value) in overrides {
            let Some(physical) = Self::physical_name(logical) else {
                tracing::debug!(key = %logical, "Override has no form field mapping");
                continue;
            };
            match doc.set_field_value(&physical, value)? {
                0 => tracing::debug!(field = %physical, "Form has no such field, skipped"),
                _ => changed.push(logical.clone()),
            }
        }

        Ok(MutatedForm {
            bytes: doc.to_bytes()?,
            changed,
        })
    }
}

/// `<stem>_modificado_<timestamp>.pdf`
pub fn mutated_file_name(source: &Path, timestamp: &str) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "formulario".to_string());
    format!("{stem}_modificado_{timestamp}.pdf")
}
