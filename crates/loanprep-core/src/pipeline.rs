use std::path::PathBuf;

use polars::prelude::DataFrame;
use tracing::info;

use crate::error::Result;
use crate::{encode, join, label, loader, reduce, unemployment};

/// File locations for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct Sources {
    /// Loan origination table (.csv or .csv.gz).
    pub loans: PathBuf,
    /// Unemployment rate series, in the same order as the state mapping.
    pub unemployment: Vec<PathBuf>,
    /// JSON mapping whose keys name the series columns.
    pub state_names: PathBuf,
}

/// Runs the full cleaning pipeline: load, reduce, label, merge the
/// unemployment series, join, and normalize the categorical columns.
///
/// Fails fast on the first stage error; there is no partial output.
pub fn preprocess(sources: &Sources) -> Result<DataFrame> {
    info!(path = %sources.loans.display(), "loading loan table");
    let loans = loader::load_primary(&sources.loans)?;

    info!(rows = loans.height(), columns = loans.width(), "reducing schema");
    let loans = reduce::reduce_schema(loans, reduce::ID_COLUMNS)?;

    info!(rows = loans.height(), "deriving default label and issue year");
    let loans = label::derive_default(loans)?;
    let loans = label::derive_issue_year(loans)?;

    info!(files = sources.unemployment.len(), "merging unemployment series");
    let series = loader::load_auxiliary(&sources.unemployment)?;
    let state_names = loader::load_state_names(&sources.state_names)?;
    let rates = unemployment::merge_unemployment(series, &state_names)?;

    info!("joining unemployment rates onto loans");
    let joined = join::join_unemployment(loans, rates)?;

    info!("normalizing categorical columns");
    let clean = encode::normalize_categoricals(joined)?;

    info!(rows = clean.height(), columns = clean.width(), "preprocessing complete");
    Ok(clean)
}
