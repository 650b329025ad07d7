use polars::prelude::*;

use crate::energy::category_of;
use crate::error::{PipelineError, Result};
use crate::reshape::{pivot_production, PRODUCTION_MWH, SOURCE_LABEL};
use crate::schema::{self, ANNUAL_PRODUCTION, MONTHLY_PRODUCTION};
use crate::values::{coerce_i64, text_series, text_values};

pub const YEAR: &str = "annee";
pub const MONTH: &str = "mois_num";
pub const REGION_CODE: &str = "code_reg";
pub const REGION_NAME: &str = "nom_reg";
pub const CATEGORY: &str = "categorie";

pub const MONTHLY_TEXT_COLUMNS: [&str; 3] = [
    schema::MONTH,
    schema::PRODUCTION_REGION_CODE,
    schema::PRODUCTION_REGION_NAME,
];

pub const ANNUAL_TEXT_COLUMNS: [&str; 2] =
    [schema::PRODUCTION_REGION_CODE, schema::PRODUCTION_REGION_NAME];

#[derive(Debug, Clone)]
pub struct CleanedAnnualProduction {
    /// One row per (annee, code_reg, filiere) with its category.
    pub detail: DataFrame,
    /// (annee, code_reg, nom_reg) -> prod_mwh summed over every source.
    pub regional: DataFrame,
}

/// Splits a `YYYY-MM` period into its year and zero-padded month.
pub fn split_period(period: &str) -> Result<(i64, String)> {
    let invalid = || PipelineError::InvalidPeriod {
        row: None,
        value: period.to_string(),
    };
    let trimmed = period.trim();

    let year = trimmed
        .get(0..4)
        .and_then(|year| year.parse::<i64>().ok())
        .ok_or_else(invalid)?;
    let month = trimmed
        .get(5..7)
        .filter(|month| month.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(invalid)?;

    Ok((year, month.to_string()))
}

pub fn clean_monthly_production(raw: &DataFrame) -> Result<DataFrame> {
    MONTHLY_PRODUCTION.validate(raw)?;

    let periods = text_values(raw.column(schema::MONTH)?)?;
    let mut years = Vec::with_capacity(periods.len());
    let mut months = Vec::with_capacity(periods.len());
    for (row, period) in periods.iter().enumerate() {
        let (year, month) =
            split_period(period.as_deref().unwrap_or_default()).map_err(|err| match err {
                PipelineError::InvalidPeriod { value, .. } => PipelineError::InvalidPeriod {
                    row: Some(row),
                    value,
                },
                other => other,
            })?;
        years.push(year);
        months.push(month);
    }

    let mut frame = with_region_columns(raw)?;
    frame.with_column(Series::new(YEAR.into(), years))?;
    frame.with_column(Series::new(MONTH.into(), months))?;

    pivot_production(&frame, &[YEAR, MONTH, REGION_CODE, REGION_NAME])
}

pub fn clean_annual_production(raw: &DataFrame) -> Result<CleanedAnnualProduction> {
    ANNUAL_PRODUCTION.validate(raw)?;

    let mut frame = with_region_columns(raw)?;
    let years = coerce_i64(raw.column(schema::YEAR)?)?;
    frame.with_column(Series::new(YEAR.into(), years))?;

    let mut detail = pivot_production(&frame, &[YEAR, REGION_CODE, REGION_NAME])?;
    let categories: Vec<Option<&str>> = detail
        .column(SOURCE_LABEL)?
        .str()?
        .into_iter()
        .map(|label| label.map(|l| category_of(l).as_str()))
        .collect();
    detail.with_column(Series::new(CATEGORY.into(), categories))?;

    let regional = detail
        .clone()
        .lazy()
        .group_by_stable([col(YEAR), col(REGION_CODE), col(REGION_NAME)])
        .agg([col(PRODUCTION_MWH).sum()])
        .collect()?;

    Ok(CleanedAnnualProduction { detail, regional })
}

/// Copies `raw` with the region code/name exposed as text `code_reg` / `nom_reg`.
fn with_region_columns(raw: &DataFrame) -> Result<DataFrame> {
    let codes = text_values(raw.column(schema::PRODUCTION_REGION_CODE)?)?;
    let names = text_values(raw.column(schema::PRODUCTION_REGION_NAME)?)?;

    let mut frame = raw.clone();
    frame.with_column(text_series(REGION_CODE, &codes))?;
    frame.with_column(text_series(REGION_NAME, &names))?;
    Ok(frame)
}
