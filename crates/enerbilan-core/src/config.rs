use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::loader::{LoadOptions, TextEncoding};

pub const RAW_DIR_ENV: &str = "ENERBILAN_RAW_DIR";
pub const PROCESSED_DIR_ENV: &str = "ENERBILAN_PROCESSED_DIR";

/// Locations and parsing settings shared by every stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    /// Encoding label understood by `encoding_rs` (`utf-8`, `windows-1252`, ...).
    pub encoding: String,
    pub delimiter: char,
    pub files: FileNames,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub consumption: String,
    pub monthly_production: String,
    pub annual_production: String,
    pub consumption_detail: String,
    pub monthly_detail: String,
    pub annual_detail: String,
    pub balance: String,
    pub geojson: String,
    pub manifest: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            consumption: "conso-departement-annuelle-2.csv".to_string(),
            monthly_production: "production-regionale-mensuelle-filiere-2.csv".to_string(),
            annual_production: "prod-region-annuelle-filiere-2.csv".to_string(),
            consumption_detail: "conso_clean_dept.csv".to_string(),
            monthly_detail: "prod_mensuelle_clean.csv".to_string(),
            annual_detail: "prod_annuelle_filiere_clean.csv".to_string(),
            balance: "bilan_energetique.csv".to_string(),
            geojson: "regions.geojson".to_string(),
            manifest: "run_manifest.json".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            encoding: "utf-8".to_string(),
            delimiter: ';',
            files: FileNames::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_dirs(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            PipelineError::Config(format!("cannot read {}: {source}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Overrides the directories from `ENERBILAN_RAW_DIR` / `ENERBILAN_PROCESSED_DIR` when set.
    pub fn apply_env(&mut self) {
        if let Ok(dir) = env::var(RAW_DIR_ENV) {
            self.raw_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var(PROCESSED_DIR_ENV) {
            self.processed_dir = PathBuf::from(dir);
        }
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(PipelineError::Config(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )))
        }
    }

    pub fn load_options(&self, text_columns: &[&str], required: bool) -> Result<LoadOptions> {
        Ok(LoadOptions {
            delimiter: self.delimiter_byte()?,
            encoding: TextEncoding::from_label(&self.encoding)?,
            text_columns: text_columns.iter().map(|name| name.to_string()).collect(),
            required,
        })
    }

    pub fn consumption_input(&self) -> PathBuf {
        self.raw_dir.join(&self.files.consumption)
    }

    pub fn monthly_input(&self) -> PathBuf {
        self.raw_dir.join(&self.files.monthly_production)
    }

    pub fn annual_input(&self) -> PathBuf {
        self.raw_dir.join(&self.files.annual_production)
    }

    pub fn consumption_detail_output(&self) -> PathBuf {
        self.processed_dir.join(&self.files.consumption_detail)
    }

    pub fn monthly_detail_output(&self) -> PathBuf {
        self.processed_dir.join(&self.files.monthly_detail)
    }

    pub fn annual_detail_output(&self) -> PathBuf {
        self.processed_dir.join(&self.files.annual_detail)
    }

    pub fn balance_output(&self) -> PathBuf {
        self.processed_dir.join(&self.files.balance)
    }

    pub fn geojson_output(&self) -> PathBuf {
        self.processed_dir.join(&self.files.geojson)
    }

    pub fn manifest_output(&self) -> PathBuf {
        self.processed_dir.join(&self.files.manifest)
    }
}
