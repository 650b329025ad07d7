use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};

use crate::balance::{build_balance, BalanceDiagnostics};
use crate::config::PipelineConfig;
use crate::consumption::{self, clean_consumption};
use crate::error::{PipelineError, Result};
use crate::loader::{load_table, LoadOptions};
use crate::manifest::write_manifest;
use crate::output::{remove_output, write_table};
use crate::production::{
    clean_annual_production, clean_monthly_production, ANNUAL_TEXT_COLUMNS, MONTHLY_TEXT_COLUMNS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Consumption,
    MonthlyProduction,
    AnnualProduction,
    Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Written { path: PathBuf, rows: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
    pub balance: BalanceDiagnostics,
}

impl PipelineReport {
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| &report.outcome)
    }

    /// True when no stage was skipped.
    pub fn is_complete(&self) -> bool {
        self.stages
            .iter()
            .all(|report| matches!(report.outcome, StageOutcome::Written { .. }))
    }
}

/// Runs every stage in order. Required-stage failures abort the run; the monthly stage
/// is optional and is reported as skipped when it cannot complete.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    info!(
        raw_dir = %config.raw_dir.display(),
        processed_dir = %config.processed_dir.display(),
        "starting energy balance pipeline"
    );
    fs::create_dir_all(&config.processed_dir)?;

    let mut stages = Vec::with_capacity(4);

    info!("stage 1/4: consumption");
    let (regional_consumption, outcome) = consumption_stage(config)?;
    stages.push(StageReport {
        stage: Stage::Consumption,
        outcome,
    });

    info!("stage 2/4: monthly production");
    stages.push(StageReport {
        stage: Stage::MonthlyProduction,
        outcome: monthly_stage(config),
    });

    info!("stage 3/4: annual production");
    let (regional_production, outcome) = annual_stage(config)?;
    stages.push(StageReport {
        stage: Stage::AnnualProduction,
        outcome,
    });

    info!("stage 4/4: balance");
    let (balance, diagnostics) = build_balance(&regional_consumption, &regional_production)?;
    if diagnostics.dropped() > 0 {
        info!(
            dropped = diagnostics.dropped(),
            "region-years present on only one side were left out of the balance"
        );
    }
    let path = config.balance_output();
    let rows = write_table(&balance, &path, config.delimiter_byte()?)?;
    stages.push(StageReport {
        stage: Stage::Balance,
        outcome: StageOutcome::Written { path, rows },
    });

    let report = PipelineReport {
        stages,
        balance: diagnostics,
    };
    write_manifest(config, &report)?;

    info!(complete = report.is_complete(), "pipeline finished");
    Ok(report)
}

fn consumption_stage(config: &PipelineConfig) -> Result<(DataFrame, StageOutcome)> {
    let options = config.load_options(&consumption::TEXT_COLUMNS, true)?;
    let raw = load_required_input(&config.consumption_input(), &options)?;
    let cleaned = clean_consumption(&raw)?;

    let path = config.consumption_detail_output();
    let rows = write_table(&cleaned.detail, &path, options.delimiter)?;
    Ok((cleaned.regional, StageOutcome::Written { path, rows }))
}

fn monthly_stage(config: &PipelineConfig) -> StageOutcome {
    let outcome = match try_monthly_stage(config) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(error = %err, "monthly production stage failed; skipping");
            StageOutcome::Skipped {
                reason: err.to_string(),
            }
        }
    };

    // a skipped stage must not leave the previous run's detail behind
    if matches!(outcome, StageOutcome::Skipped { .. }) {
        let stale = config.monthly_detail_output();
        if let Err(err) = remove_output(&stale) {
            warn!(path = %stale.display(), error = %err, "could not remove stale monthly output");
        }
    }
    outcome
}

fn try_monthly_stage(config: &PipelineConfig) -> Result<StageOutcome> {
    let options = config.load_options(&MONTHLY_TEXT_COLUMNS, false)?;
    let input = config.monthly_input();
    let Some(raw) = load_table(&input, &options)? else {
        return Ok(StageOutcome::Skipped {
            reason: format!("{} not found", input.display()),
        });
    };
    let detail = clean_monthly_production(&raw)?;

    let path = config.monthly_detail_output();
    let rows = write_table(&detail, &path, options.delimiter)?;
    Ok(StageOutcome::Written { path, rows })
}

fn annual_stage(config: &PipelineConfig) -> Result<(DataFrame, StageOutcome)> {
    let options = config.load_options(&ANNUAL_TEXT_COLUMNS, true)?;
    let raw = load_required_input(&config.annual_input(), &options)?;
    let cleaned = clean_annual_production(&raw)?;

    let path = config.annual_detail_output();
    let rows = write_table(&cleaned.detail, &path, options.delimiter)?;
    Ok((cleaned.regional, StageOutcome::Written { path, rows }))
}

fn load_required_input(path: &Path, options: &LoadOptions) -> Result<DataFrame> {
    load_table(path, options)?.ok_or_else(|| PipelineError::MissingRequiredFile {
        path: path.to_path_buf(),
        source: io::ErrorKind::NotFound.into(),
    })
}
