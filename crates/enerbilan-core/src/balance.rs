use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consumption;
use crate::error::Result;
use crate::reshape::PRODUCTION_MWH;

pub const YEAR: &str = "annee";
pub const REGION_CODE: &str = "code_reg";
pub const REGION_NAME: &str = "nom_region";
pub const CONSUMPTION_TOTAL: &str = "conso_totale";
pub const PRODUCTION_TOTAL: &str = PRODUCTION_MWH;
pub const COVERAGE_RATIO: &str = "taux_couverture";
pub const STATUS: &str = "couleur_carte";

const GREEN_THRESHOLD: f64 = 100.0;
const ORANGE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageStatus {
    Green,
    Orange,
    Red,
    /// Consumption total is zero or not a number, so no ratio exists.
    Unknown,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Green => "Green",
            CoverageStatus::Orange => "Orange",
            CoverageStatus::Red => "Red",
            CoverageStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row counts of the (annee, code_reg) join, including what it dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDiagnostics {
    pub matched: usize,
    pub consumption_only: usize,
    pub production_only: usize,
}

impl BalanceDiagnostics {
    pub fn dropped(&self) -> usize {
        self.consumption_only + self.production_only
    }
}

const ROW_ORDER: &str = "__row_order";

fn join_keys() -> [Expr; 2] {
    [col(YEAR), col(REGION_CODE)]
}

/// Null unless the value is finite (and non-zero when `reject_zero` is set).
fn usable(expr: Expr, reject_zero: bool) -> Expr {
    let mut unusable = expr.clone().is_finite().not();
    if reject_zero {
        unusable = unusable.or(expr.clone().eq(lit(0.0)));
    }
    when(unusable)
        .then(lit(NULL).cast(DataType::Float64))
        .otherwise(expr)
}

/// Rounds half away from zero to two decimals.
fn round_hundredths(expr: Expr) -> Expr {
    let scaled = expr * lit(100.0);
    when(scaled.clone().gt_eq(lit(0.0)))
        .then((scaled.clone() + lit(0.5)).cast(DataType::Int64))
        .otherwise((scaled - lit(0.5)).cast(DataType::Int64))
        .cast(DataType::Float64)
        / lit(100.0)
}

/// Production as a percentage of consumption, rounded to two decimals.
///
/// Null when consumption is zero, null or not finite.
pub fn coverage_ratio_expr() -> Expr {
    let production = usable(col(PRODUCTION_TOTAL), false);
    let consumption = usable(col(CONSUMPTION_TOTAL), true);
    round_hundredths(production / consumption * lit(100.0)).alias(COVERAGE_RATIO)
}

pub fn coverage_status_expr() -> Expr {
    let ratio = col(COVERAGE_RATIO);
    when(ratio.clone().is_null())
        .then(lit(CoverageStatus::Unknown.as_str()))
        .when(ratio.clone().gt_eq(lit(GREEN_THRESHOLD)))
        .then(lit(CoverageStatus::Green.as_str()))
        .when(ratio.gt_eq(lit(ORANGE_THRESHOLD)))
        .then(lit(CoverageStatus::Orange.as_str()))
        .otherwise(lit(CoverageStatus::Red.as_str()))
        .alias(STATUS)
}

/// Inner-joins regional consumption with regional production on (annee, code_reg).
///
/// Consumption row order is kept and its region name becomes `nom_region`. Production rows
/// sharing a key are summed before the join.
pub fn build_balance(
    consumption: &DataFrame,
    production: &DataFrame,
) -> Result<(DataFrame, BalanceDiagnostics)> {
    let consumption_lf = consumption
        .clone()
        .lazy()
        .select([
            col(consumption::YEAR).cast(DataType::Int64).alias(YEAR),
            col(consumption::REGION_CODE)
                .cast(DataType::String)
                .alias(REGION_CODE),
            col(consumption::REGION_NAME).alias(REGION_NAME),
            col(consumption::TOTAL)
                .cast(DataType::Float64)
                .alias(CONSUMPTION_TOTAL),
        ])
        .with_row_index(ROW_ORDER, None);

    let production_lf = production
        .clone()
        .lazy()
        .select([
            col(YEAR).cast(DataType::Int64),
            col(REGION_CODE).cast(DataType::String),
            col(PRODUCTION_TOTAL)
                .cast(DataType::Float64)
                .fill_null(lit(0.0)),
        ])
        .group_by_stable(join_keys())
        .agg([col(PRODUCTION_TOTAL).sum()]);

    let balance = consumption_lf
        .clone()
        .join(
            production_lf.clone(),
            join_keys(),
            join_keys(),
            JoinArgs::new(JoinType::Inner),
        )
        .sort([ROW_ORDER], SortMultipleOptions::default())
        .with_column(coverage_ratio_expr())
        .with_column(coverage_status_expr())
        .select([
            col(YEAR),
            col(REGION_CODE),
            col(REGION_NAME),
            col(CONSUMPTION_TOTAL),
            col(PRODUCTION_TOTAL),
            col(COVERAGE_RATIO),
            col(STATUS),
        ])
        .collect()?;

    let consumption_only = consumption_lf
        .clone()
        .join(
            production_lf.clone(),
            join_keys(),
            join_keys(),
            JoinArgs::new(JoinType::Anti),
        )
        .collect()?
        .height();
    let production_only = production_lf
        .join(
            consumption_lf,
            join_keys(),
            join_keys(),
            JoinArgs::new(JoinType::Anti),
        )
        .collect()?
        .height();

    let diagnostics = BalanceDiagnostics {
        matched: balance.height(),
        consumption_only,
        production_only,
    };
    info!(
        matched = diagnostics.matched,
        consumption_only = diagnostics.consumption_only,
        production_only = diagnostics.production_only,
        "balance join complete"
    );

    Ok((balance, diagnostics))
}
