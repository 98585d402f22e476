use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Reads the loan origination table. The file may be plain CSV or
/// gzip-compressed; the reader sniffs the compression from the content.
pub fn load_primary(path: &Path) -> Result<DataFrame> {
    read_table(path)
}

/// Reads the unemployment rate series in the given order. Fails on the
/// first unreadable file.
pub fn load_auxiliary(paths: &[PathBuf]) -> Result<Vec<DataFrame>> {
    paths.iter().map(|path| read_table(path)).collect()
}

/// Reads the state name mapping and returns its keys in file order. The key
/// order drives the positional rename of the merged series columns.
pub fn load_state_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mapping: serde_json::Map<String, serde_json::Value> = serde_json::from_reader(file)?;
    Ok(mapping.keys().cloned().collect())
}

fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PipelineError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }

    // Infer over the whole file; the loan table mixes sparse and dense
    // columns and a short inference window misreads the sparse ones.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}
