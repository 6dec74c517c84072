//! Reference catalog of instructors and vessels

use crate::record::{
    A_DNI, A_INSTR, B_AMARRE, B_ESLORA, B_FONDEO, B_INSTALACION, B_MATRICULA, B_NOMEMB,
    B_POTENCIA,
};
use crate::{LicenciaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// An instructor who can sign the practice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    /// National ID
    #[serde(alias = "dni")]
    pub id: String,
    pub name: String,
}

/// A school vessel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vessel {
    pub name: String,
    pub registration: String,
    pub berth: String,
    pub mooring: String,
    pub power: String,
    pub length: String,
    pub facility: String,
}

/// Instructors and vessels to choose from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub instructors: Vec<Instructor>,
    #[serde(default)]
    pub vessels: Vec<Vessel>,
}

impl Catalog {
    /// Parse a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LicenciaError::Catalog(e.to_string()))
    }

    /// Find an instructor by identifier or name (case-insensitive)
    pub fn find_instructor(&self, key: &str) -> Option<&Instructor> {
        let key = key.trim();
        self.instructors
            .iter()
            .find(|i| i.id.eq_ignore_ascii_case(key))
            .or_else(|| {
                let lower = key.to_lowercase();
                self.instructors.iter().find(|i| i.name.to_lowercase() == lower)
            })
    }

    /// Find a vessel by registration or name (case-insensitive)
    pub fn find_vessel(&self, key: &str) -> Option<&Vessel> {
        let key = key.trim();
        self.vessels
            .iter()
            .find(|v| v.registration.eq_ignore_ascii_case(key))
            .or_else(|| {
                let lower = key.to_lowercase();
                self.vessels.iter().find(|v| v.name.to_lowercase() == lower)
            })
    }
}

impl Instructor {
    /// Field Store values this instructor sets
    pub fn overrides(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (A_INSTR.to_string(), self.name.clone()),
            (A_DNI.to_string(), self.id.clone()),
        ])
    }
}

impl Vessel {
    /// Field Store values this vessel sets; blank attributes are left out
    pub fn overrides(&self) -> BTreeMap<String, String> {
        [
            (B_NOMEMB, &self.name),
            (B_MATRICULA, &self.registration),
            (B_AMARRE, &self.berth),
            (B_FONDEO, &self.mooring),
            (B_POTENCIA, &self.power),
            (B_ESLORA, &self.length),
            (B_INSTALACION, &self.facility),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
    }
}

/// Source of the reference catalog, read fresh on every call
pub trait CatalogLoader {
    fn load(&self) -> Result<Catalog>;
}

/// Catalog stored as a JSON file
#[derive(Debug, Clone)]
pub struct JsonCatalogFile {
    path: PathBuf,
}

impl JsonCatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogLoader for JsonCatalogFile {
    fn load(&self) -> Result<Catalog> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            LicenciaError::Catalog(format!("{}: {}", self.path.display(), e))
        })?;
        let catalog = Catalog::from_json(&json)?;
        tracing::debug!(
            path = %self.path.display(),
            instructors = catalog.instructors.len(),
            vessels = catalog.vessels.len(),
            "Loaded reference catalog"
        );
        Ok(catalog)
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Catalog);

impl CatalogLoader for StaticCatalog {
    fn load(&self) -> Result<Catalog> {
        Ok(self.0.clone())
    }
}

impl<L: CatalogLoader + ?Sized> CatalogLoader for &L {
    fn load(&self) -> Result<Catalog> {
        (**self).load()
    }
}

impl<L: CatalogLoader + ?Sized> CatalogLoader for Box<L> {
    fn load(&self) -> Result<Catalog> {
        (**self).load()
    }
}

/// Instructor and vessel picked by the operator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Instructor identifier or name
    pub instructor: Option<String>,
    /// Vessel registration or name
    pub vessel: Option<String>,
}

impl Selection {
    pub fn new(instructor: Option<&str>, vessel: Option<&str>) -> Self {
        Self {
            instructor: instructor.map(str::to_string),
            vessel: vessel.map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instructor.is_none() && self.vessel.is_none()
    }

    /// Resolve the selection against a catalog
    ///
    /// Returns the overrides for every entry that was found together with
    /// an error for every entry that was not.
    pub fn resolve(&self, catalog: &Catalog) -> (BTreeMap<String, String>, Vec<LicenciaError>) {
        let mut overrides = BTreeMap::new();
        let mut problems = Vec::new();

        if let Some(key) = &self.instructor {
            match catalog.find_instructor(key) {
                Some(instructor) => overrides.extend(instructor.overrides()),
                None => problems.push(LicenciaError::UnknownInstructor(key.clone())),
            }
        }
        if let Some(key) = &self.vessel {
            match catalog.find_vessel(key) {
                Some(vessel) => overrides.extend(vessel.overrides()),
                None => problems.push(LicenciaError::UnknownVessel(key.clone())),
            }
        }

        (overrides, problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CATALOG: &str = r#"{
        "instructors": [
            { "id": "11111111-A", "name": "Juan Pérez" },
            { "dni": "33333333-C", "name": "Marta Gil" }
        ],
        "vessels": [
            {
                "name": "Velero Águila",
                "registration": "AB-1234",
                "berth": "Pantalán 3",
                "power": "30 CV",
                "length": "9,5 m"
            }
        ]
    }"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.instructors.len(), 2);
        assert_eq!(catalog.instructors[1].id, "33333333-C");
        assert_eq!(catalog.vessels[0].mooring, "");
    }

    #[test]
    fn test_malformed_catalog() {
        assert!(matches!(
            Catalog::from_json("{ \"instructors\": 3 }"),
            Err(LicenciaError::Catalog(_))
        ));
    }

    #[test]
    fn test_find_entries() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.find_instructor("marta gil").unwrap().id, "33333333-C");
        assert_eq!(catalog.find_instructor("11111111-a").unwrap().name, "Juan Pérez");
        assert!(catalog.find_instructor("Nadie").is_none());
        assert_eq!(catalog.find_vessel("ab-1234").unwrap().name, "Velero Águila");
        assert_eq!(catalog.find_vessel("VELERO ÁGUILA").unwrap().registration, "AB-1234");
    }

    #[test]
    fn test_resolve_selection() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let (overrides, problems) =
            Selection::new(Some("Marta Gil"), Some("AB-1234")).resolve(&catalog);
        assert!(problems.is_empty());
        assert_eq!(overrides.get(A_INSTR).map(String::as_str), Some("Marta Gil"));
        assert_eq!(overrides.get(A_DNI).map(String::as_str), Some("33333333-C"));
        assert_eq!(overrides.get(B_POTENCIA).map(String::as_str), Some("30 CV"));
        assert!(!overrides.contains_key(B_FONDEO));
    }

    #[test]
    fn test_resolve_unknown_entries() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let (overrides, problems) =
            Selection::new(Some("Nadie"), Some("AB-1234")).resolve(&catalog);
        assert_eq!(overrides.get(B_NOMEMB).map(String::as_str), Some("Velero Águila"));
        assert!(matches!(problems.as_slice(), [LicenciaError::UnknownInstructor(_)]));
    }

    #[test]
    fn test_static_catalog_loader() {
        let loader = StaticCatalog(Catalog::from_json(CATALOG).unwrap());
        assert_eq!(loader.load().unwrap().vessels.len(), 1);
        let boxed: Box<dyn CatalogLoader> = Box::new(loader);
        assert_eq!(boxed.load().unwrap().instructors.len(), 2);
    }

    #[test]
    fn test_missing_catalog_file() {
        let loader = JsonCatalogFile::new("/no/existe/catalogo.json");
        assert!(matches!(loader.load(), Err(LicenciaError::Catalog(_))));
    }
}
