use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::schema::{self, CONSUMPTION};
use crate::values::{coerce_f64, coerce_i64, text_series, text_values};

pub const YEAR: &str = "annee";
pub const REGION_CODE: &str = "code_reg";
pub const REGION_NAME: &str = "nom_reg";
pub const TOTAL: &str = "conso_totale";

/// Source header to normalized column, in output order.
pub const RENAMES: [(&str, &str); 11] = [
    (schema::YEAR, YEAR),
    (schema::DEPARTMENT_CODE, "code_dept"),
    (schema::DEPARTMENT_NAME, "nom_dept"),
    (schema::CONSUMPTION_REGION_CODE, REGION_CODE),
    (schema::CONSUMPTION_REGION_NAME, REGION_NAME),
    (schema::CONSUMPTION_AGRICULTURE, "conso_agriculture"),
    (schema::CONSUMPTION_INDUSTRY, "conso_industrie"),
    (schema::CONSUMPTION_RESIDENTIAL, "conso_residentiel"),
    (schema::CONSUMPTION_TERTIARY, "conso_tertiaire"),
    (schema::CONSUMPTION_OTHER, "conso_autre"),
    (schema::CONSUMPTION_TOTAL, TOTAL),
];

pub const TEXT_COLUMNS: [&str; 4] = [
    schema::DEPARTMENT_CODE,
    schema::DEPARTMENT_NAME,
    schema::CONSUMPTION_REGION_CODE,
    schema::CONSUMPTION_REGION_NAME,
];

#[derive(Debug, Clone)]
pub struct CleanedConsumption {
    /// Department-level rows, renamed and restricted to known columns.
    pub detail: DataFrame,
    /// (annee, code_reg, nom_reg) -> conso_totale summed over departments.
    pub regional: DataFrame,
}

pub fn clean_consumption(raw: &DataFrame) -> Result<CleanedConsumption> {
    let optional = CONSUMPTION.validate(raw)?;

    let kept: Vec<(&str, &str)> = RENAMES
        .iter()
        .copied()
        .filter(|(source, _)| CONSUMPTION.required.contains(source) || optional.contains(source))
        .collect();
    debug!(
        kept = kept.len(),
        dropped = RENAMES.len() - kept.len(),
        "consumption columns selected"
    );

    let mut detail = raw.select(kept.iter().map(|(source, _)| *source))?;
    for (source, target) in &kept {
        detail.rename(source, (*target).into())?;
    }

    let years = coerce_i64(detail.column(YEAR)?)?;
    detail.with_column(Series::new(YEAR.into(), years))?;
    for code in [REGION_CODE, "code_dept"] {
        if let Ok(column) = detail.column(code) {
            let values = text_values(column)?;
            detail.with_column(text_series(code, &values))?;
        }
    }

    let regional = aggregate_by_region(&detail)?;
    Ok(CleanedConsumption { detail, regional })
}

fn aggregate_by_region(detail: &DataFrame) -> Result<DataFrame> {
    let totals = coerce_f64(detail.column(TOTAL)?)?;
    let frame = DataFrame::new(vec![
        detail.column(YEAR)?.clone(),
        detail.column(REGION_CODE)?.clone(),
        detail.column(REGION_NAME)?.cast(&DataType::String)?,
        Series::new(TOTAL.into(), totals).into(),
    ])?;

    let regional = frame
        .lazy()
        .group_by_stable([col(YEAR), col(REGION_CODE), col(REGION_NAME)])
        // an all-null group stays null instead of summing to 0
        .agg([when(col(TOTAL).is_not_null().sum().gt(lit(0)))
            .then(col(TOTAL).sum())
            .otherwise(lit(NULL).cast(DataType::Float64))
            .alias(TOTAL)])
        .collect()?;
    Ok(regional)
}
