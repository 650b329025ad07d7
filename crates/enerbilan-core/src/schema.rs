use std::collections::HashSet;

use polars::prelude::DataFrame;

use crate::energy::EnergySource;
use crate::error::{PipelineError, Result};

pub const YEAR: &str = "Année";
pub const MONTH: &str = "Mois";
pub const DEPARTMENT_CODE: &str = "Code département";
pub const DEPARTMENT_NAME: &str = "Libellé département";
pub const CONSUMPTION_REGION_CODE: &str = "Code région";
pub const CONSUMPTION_REGION_NAME: &str = "Libellé région";
pub const CONSUMPTION_TOTAL: &str = "Consommation totale (MWh)";
pub const CONSUMPTION_AGRICULTURE: &str = "Consommation Agriculture (MWh)";
pub const CONSUMPTION_INDUSTRY: &str = "Consommation Industrie (MWh)";
pub const CONSUMPTION_RESIDENTIAL: &str = "Consommation Résidentiel (MWh)";
pub const CONSUMPTION_TERTIARY: &str = "Consommation Tertiaire (MWh)";
pub const CONSUMPTION_OTHER: &str = "Consommation Autre (MWh)";
pub const PRODUCTION_REGION_CODE: &str = "Code INSEE région";
pub const PRODUCTION_REGION_NAME: &str = "Région";
pub const REGION_SHAPE: &str = "Géo-shape région";
pub const REGION_POINT: &str = "Géo-point région";

pub const SOURCE_COLUMNS: [&str; 6] = [
    EnergySource::Nuclear.raw_column(),
    EnergySource::Thermal.raw_column(),
    EnergySource::Hydraulic.raw_column(),
    EnergySource::Wind.raw_column(),
    EnergySource::Solar.raw_column(),
    EnergySource::Bioenergy.raw_column(),
];

/// Declared shape of an input table: required columns abort the stage when absent,
/// optional columns silently narrow the output.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

pub const CONSUMPTION: TableSchema = TableSchema {
    name: "consumption",
    required: &[
        YEAR,
        CONSUMPTION_REGION_CODE,
        CONSUMPTION_REGION_NAME,
        CONSUMPTION_TOTAL,
    ],
    optional: &[
        DEPARTMENT_CODE,
        DEPARTMENT_NAME,
        CONSUMPTION_AGRICULTURE,
        CONSUMPTION_INDUSTRY,
        CONSUMPTION_RESIDENTIAL,
        CONSUMPTION_TERTIARY,
        CONSUMPTION_OTHER,
    ],
};

pub const MONTHLY_PRODUCTION: TableSchema = TableSchema {
    name: "monthly production",
    required: &[MONTH, PRODUCTION_REGION_CODE, PRODUCTION_REGION_NAME],
    optional: &SOURCE_COLUMNS,
};

pub const ANNUAL_PRODUCTION: TableSchema = TableSchema {
    name: "annual production",
    required: &[YEAR, PRODUCTION_REGION_CODE, PRODUCTION_REGION_NAME],
    optional: &SOURCE_COLUMNS,
};

pub const REGION_GEOGRAPHY: TableSchema = TableSchema {
    name: "region geography",
    required: &[PRODUCTION_REGION_CODE, PRODUCTION_REGION_NAME, REGION_SHAPE],
    optional: &[REGION_POINT],
};

impl TableSchema {
    /// Checks the required set and returns the optional columns present in `df`.
    pub fn validate(&self, df: &DataFrame) -> Result<Vec<&'static str>> {
        let present: HashSet<&str> = df.get_column_names_str().into_iter().collect();

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|column| !present.contains(*column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns {
                table: self.name,
                columns: missing,
            });
        }

        Ok(self
            .optional
            .iter()
            .copied()
            .filter(|column| present.contains(column))
            .collect())
    }
}
