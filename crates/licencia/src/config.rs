//! Generator configuration

use crate::{LicenciaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Who issues the certificates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// Printed with its "D." prefix in the opening sentence
    pub director_name: String,
    pub director_id: String,
    pub school_name: String,
    /// Where the practice took place
    pub venue: String,
    /// Regulation the training complies with
    pub regulation: String,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            director_name: "VICENTE RODRÍGUEZ ALONSO".to_string(),
            director_id: "46866307-N".to_string(),
            school_name: "ESCUELA NÁUTICA ALIBOAT".to_string(),
            venue: "Real Club de Regatas Alicante".to_string(),
            regulation: "Real Decreto 875/2014 de 10 de octubre".to_string(),
        }
    }
}

/// Settings for a [`crate::Generator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory under which run directories are created
    pub output_root: PathBuf,
    /// School logo printed on certificates (JPEG or PNG)
    pub logo: Option<PathBuf>,
    pub issuer: IssuerConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            logo: None,
            issuer: IssuerConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load a JSON configuration file; missing keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| LicenciaError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LicenciaError::Config(e.to_string()))
    }

    /// Read the logo bytes, if a logo is configured and readable
    pub fn logo_bytes(&self) -> Option<Vec<u8>> {
        let path = self.logo.as_ref()?;
        match std::fs::read(path) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Logo not readable, certificates go without it");
                None
            }
        }
    }
}
