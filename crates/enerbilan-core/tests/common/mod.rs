#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use enerbilan_core::PipelineConfig;
use uuid::Uuid;

pub const CONSUMPTION_CSV: &str = "\
Année;Code département;Libellé département;Code région;Libellé région;Consommation totale (MWh)
2021;75;Paris;11;Île-de-France;1000
";

pub const ANNUAL_CSV: &str = "\
Année;Code INSEE région;Région;Production nucléaire (GWh);Production thermique (GWh);Production éolienne (GWh)
2021;11;Île-de-France;0.6;;0.4
";

pub const MONTHLY_CSV: &str = "\
Mois;Code INSEE région;Région;Production nucléaire (GWh);Production éolienne (GWh);Géo-shape région;Géo-point région
2021-01;11;Île-de-France;0.05;0.03;\"{\"\"type\"\": \"\"Polygon\"\", \"\"coordinates\"\": [[[2.0, 48.0], [3.0, 48.0], [3.0, 49.0], [2.0, 48.0]]]}\";48.7, 2.5
2021-02;11;Île-de-France;0.04;n/a;;
";

/// Scratch directory with `raw/` and `processed/` subdirectories, removed on drop.
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("enerbilan-test-{}", Uuid::new_v4()));
        fs::create_dir_all(root.join("raw")).expect("create raw dir");
        Self { root }
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::with_dirs(self.root.join("raw"), self.root.join("processed"))
    }

    pub fn write_raw(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.join("raw").join(name);
        fs::write(&path, content).expect("write raw fixture");
        path
    }

    /// Writes the three default inputs; `monthly` may be omitted.
    pub fn seed(&self, consumption: &str, monthly: Option<&str>, annual: &str) -> PipelineConfig {
        let config = self.config();
        self.write_raw(&config.files.consumption, consumption);
        if let Some(monthly) = monthly {
            self.write_raw(&config.files.monthly_production, monthly);
        }
        self.write_raw(&config.files.annual_production, annual);
        config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
