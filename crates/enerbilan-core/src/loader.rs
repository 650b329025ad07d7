use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

/// Wrapper over an `encoding_rs` encoding so configuration can carry it by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding(&'static Encoding);

impl TextEncoding {
    pub fn from_label(label: &str) -> Result<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Self)
            .ok_or_else(|| PipelineError::UnknownEncoding(label.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self(UTF_8)
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: TextEncoding,
    /// Columns kept as opaque text. Codes such as `"02"` or `"2A"` belong here.
    pub text_columns: Vec<String>,
    pub required: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            encoding: TextEncoding::default(),
            text_columns: Vec::new(),
            required: true,
        }
    }
}

impl LoadOptions {
    fn is_text_column(&self, name: &str) -> bool {
        self.text_columns.iter().any(|column| column == name)
    }
}

/// Loads a delimited file, honoring `options.required`.
///
/// Returns `Ok(None)` only for an optional file that does not exist.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Option<DataFrame>> {
    if options.required {
        load_required(path, options).map(Some)
    } else {
        load_optional(path, options)
    }
}

pub fn load_required(path: &Path, options: &LoadOptions) -> Result<DataFrame> {
    let bytes = fs::read(path).map_err(|source| PipelineError::MissingRequiredFile {
        path: path.to_path_buf(),
        source,
    })?;
    decode_and_parse(path, &bytes, options)
}

pub fn load_optional(path: &Path, options: &LoadOptions) -> Result<Option<DataFrame>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "optional input file not found");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    decode_and_parse(path, &bytes, options).map(Some)
}

fn decode_and_parse(path: &Path, bytes: &[u8], options: &LoadOptions) -> Result<DataFrame> {
    // `decode` sniffs and removes a byte-order mark.
    let (text, _, had_errors) = options.encoding.0.decode(bytes);
    if had_errors {
        warn!(
            path = %path.display(),
            encoding = options.encoding.name(),
            "input contained malformed sequences; replaced with U+FFFD"
        );
    }

    let df = parse_table(&text, options)?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

/// Parses already-decoded delimited text.
///
/// Every column is read as text first; columns outside `text_columns` are then narrowed to
/// Int64 or Float64 when all of their values parse.
pub fn parse_table(text: &str, options: &LoadOptions) -> Result<DataFrame> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(options.delimiter))
        .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
        .finish()?;

    let original: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let mut names = Vec::with_capacity(original.len());
    for name in original {
        let trimmed = name.trim().to_string();
        if trimmed != name {
            df.rename(&name, trimmed.as_str().into())?;
        }
        names.push(trimmed);
    }

    for name in names {
        if options.is_text_column(&name) {
            continue;
        }
        let narrowed = narrow_column(df.column(&name)?.as_materialized_series());
        if let Some(series) = narrowed {
            df.with_column(series)?;
        }
    }

    Ok(df)
}

fn narrow_column(series: &Series) -> Option<Series> {
    [DataType::Int64, DataType::Float64]
        .iter()
        .find_map(|dtype| series.strict_cast(dtype).ok())
}
