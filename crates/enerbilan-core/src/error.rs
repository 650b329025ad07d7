// crates/enerbilan-core/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("required input file {} could not be opened: {source}", path.display())]
    MissingRequiredFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{table} table is missing required columns: {}", columns.join(", "))]
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },

    #[error(
        "period '{value}'{} is not in YYYY-MM form",
        row.map(|row| format!(" at row {row}")).unwrap_or_default()
    )]
    InvalidPeriod { row: Option<usize>, value: String },

    #[error("unknown text encoding label '{0}'")]
    UnknownEncoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML configuration error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
