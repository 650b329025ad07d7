//! Column coercion helpers shared by the cleaners.

use polars::prelude::*;

/// Reads a column as floats. Text is parsed leniently (trimmed, decimal comma accepted);
/// anything unparseable or non-finite becomes `None`.
pub fn coerce_f64(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    if column.dtype() == &DataType::String {
        return Ok(column
            .str()?
            .into_iter()
            .map(|value| value.and_then(parse_decimal))
            .collect());
    }

    let cast = column.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| v.is_finite()))
        .collect())
}

pub fn coerce_i64(column: &Column) -> PolarsResult<Vec<Option<i64>>> {
    if column.dtype() == &DataType::String {
        return Ok(column
            .str()?
            .into_iter()
            .map(|value| value.and_then(|v| v.trim().parse::<i64>().ok()))
            .collect());
    }

    let cast = column.cast(&DataType::Int64)?;
    Ok(cast.i64()?.into_iter().collect())
}

/// Reads a column as owned strings, casting numeric columns to their textual form.
pub fn text_values(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Builds a String series from optional owned values.
pub fn text_series(name: &str, values: &[Option<String>]) -> Series {
    Series::new(
        name.into(),
        values
            .iter()
            .map(|opt| opt.as_deref())
            .collect::<Vec<Option<&str>>>(),
    )
}

pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
