use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::error::Result;

/// Writes `df` as delimited UTF-8 text with a byte-order mark and a header row.
///
/// The file only appears at `path` once fully written. Returns the number of data rows.
pub fn write_table(df: &DataFrame, path: &Path, delimiter: u8) -> Result<usize> {
    replace_file(path, |file| {
        let mut frame = df.clone();
        CsvWriter::new(&mut *file)
            .include_bom(true)
            .include_header(true)
            .with_separator(delimiter)
            .finish(&mut frame)?;
        Ok(())
    })?;

    info!(path = %path.display(), rows = df.height(), "wrote table");
    Ok(df.height())
}

/// Writes `bytes` to `path` through a sibling temporary file.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    replace_file(path, |file| Ok(file.write_all(bytes)?))
}

/// Deletes an output left by an earlier run. Returns whether a file was removed.
pub fn remove_output(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed stale output");
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temporary_path(path);
    let written: Result<()> = File::create(&tmp)
        .map_err(Into::into)
        .and_then(|mut file| {
            write(&mut file)?;
            file.sync_all()?;
            Ok(())
        });

    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}
