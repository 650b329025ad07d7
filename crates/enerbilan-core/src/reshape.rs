use polars::prelude::*;
use tracing::debug;

use crate::energy::EnergySource;
use crate::error::Result;
use crate::values::coerce_f64;

pub const SOURCE_LABEL: &str = "filiere";
pub const PRODUCTION_GWH: &str = "prod_gwh";
pub const PRODUCTION_MWH: &str = "prod_mwh";

const MWH_PER_GWH: f64 = 1000.0;

/// Converts a wide production table (one column per energy source) into one row per
/// (input row, source), carrying `id_columns` along.
///
/// Sources whose column is absent are skipped. Missing or unparseable values become 0.
/// Rows are grouped by source in `EnergySource::ALL` order, input order within a source.
pub fn pivot_production(df: &DataFrame, id_columns: &[&str]) -> Result<DataFrame> {
    let ids = df.select(id_columns.iter().copied())?;
    let rows = df.height();

    let mut frames: Vec<DataFrame> = Vec::new();
    for source in EnergySource::ALL {
        let Ok(column) = df.column(source.raw_column()) else {
            debug!(column = source.raw_column(), "energy column absent; skipping");
            continue;
        };

        let gwh: Vec<f64> = coerce_f64(column)?
            .into_iter()
            .map(|value| value.unwrap_or(0.0))
            .collect();
        frames.push(source_frame(&ids, &vec![source.label(); rows], gwh)?);
    }

    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        return Ok(source_frame(&ids.clear(), &[], Vec::new())?);
    };
    for frame in iter {
        combined.vstack_mut(&frame)?;
    }
    Ok(combined)
}

fn source_frame(ids: &DataFrame, labels: &[&str], gwh: Vec<f64>) -> PolarsResult<DataFrame> {
    let mwh: Vec<f64> = gwh.iter().map(|value| value * MWH_PER_GWH).collect();

    let mut frame = ids.clone();
    frame.hstack_mut(&mut [
        Series::new(SOURCE_LABEL.into(), labels).into(),
        Series::new(PRODUCTION_GWH.into(), gwh).into(),
        Series::new(PRODUCTION_MWH.into(), mwh).into(),
    ])?;
    Ok(frame)
}
