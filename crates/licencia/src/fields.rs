//! Field Store: the text fields of a filled practice form

use crate::{LicenciaError, Result};
use pdf_core::PdfDocument;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Prefixes of the fields the pipeline reads
pub const FIELD_PREFIXES: [&str; 4] = ["A_", "B_", "C_", "D_"];

/// Text field values keyed by their cleaned field name
///
/// Values are trimmed and never empty; an empty field is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldStore {
    values: BTreeMap<String, String>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the text fields of a form document on disk
    ///
    /// Any failure to open the file or a document without fields aborts with
    /// an error before anything is written.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| LicenciaError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let doc = PdfDocument::open_from_bytes(&data).map_err(|e| {
            LicenciaError::SourceUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        Self::from_document(&doc)
    }

    /// Collect the text fields of an opened document
    ///
    /// A form whose `A_`..`D_` fields are all blank counts as having no
    /// fields at all.
    pub fn from_document(doc: &PdfDocument) -> Result<Self> {
        let fields = doc.form_fields()?;
        let text_fields: Vec<_> = fields.into_iter().filter(|f| f.is_text()).collect();
        if text_fields.is_empty() {
            return Err(LicenciaError::NoFormFields);
        }

        let mut store = Self::new();
        for field in text_fields {
            let Some(name) = clean_field_name(&field.name) else {
                continue;
            };
            if let Some(value) = field.value {
                store.insert(name, value);
            }
        }

        if store.is_empty() {
            return Err(LicenciaError::NoFormFields);
        }

        tracing::debug!(count = store.len(), "Read form fields");
        Ok(store)
    }

    /// Insert a value; empty values (after trimming) remove the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl AsRef<str>) {
        let key = key.into();
        let value = value.as_ref().trim();
        if value.is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value.to_string());
        }
    }

    /// Value of a field, `None` when absent or empty
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of a field, empty string when absent
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply a set of overrides on top of the form values
    pub fn merge(&mut self, overrides: &BTreeMap<String, String>) {
        for (key, value) in overrides {
            self.insert(key.clone(), value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for FieldStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (key, value) in iter {
            store.insert(key, value);
        }
        store
    }
}

/// Strip the `[n]` index suffix and keep only names with a known prefix
///
/// # Examples
/// ```
/// use licencia::fields::clean_field_name;
/// assert_eq!(clean_field_name("A_INSTR[0]").as_deref(), Some("A_INSTR"));
/// assert_eq!(clean_field_name("Check Box1"), None);
/// ```
pub fn clean_field_name(raw: &str) -> Option<String> {
    if !FIELD_PREFIXES.iter().any(|prefix| raw.starts_with(prefix)) {
        return None;
    }
    let base = raw.split('[').next().unwrap_or(raw).trim();
    Some(base.to_string())
}
