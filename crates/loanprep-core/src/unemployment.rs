use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Temporal key column shared by every unemployment series file.
pub const OBSERVATION_DATE: &str = "observation_date";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Merges the per-file unemployment series into one long-form table with one
/// row per (year, state) and a `rate` value column.
///
/// The files are outer-joined on the observation date, so a date missing
/// from one file null-fills that file's columns. The surviving value columns
/// are renamed positionally to `state_names`, which must therefore list one
/// name per value column across all files, in file column order.
pub fn merge_unemployment(frames: Vec<DataFrame>, state_names: &[String]) -> Result<DataFrame> {
    let mut iter = frames.into_iter();
    let Some(first) = iter.next() else {
        return Err(PipelineError::Schema(
            "no unemployment series files were provided".to_string(),
        ));
    };
    ensure_observation_date(&first)?;

    let mut wide = first;
    for frame in iter {
        ensure_observation_date(&frame)?;
        wide = wide
            .lazy()
            .join(
                frame.lazy(),
                [col(OBSERVATION_DATE)],
                [col(OBSERVATION_DATE)],
                JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
            )
            .collect()?;
    }

    let years: Vec<i32> = {
        let dates = wide.column(OBSERVATION_DATE)?.str()?;
        let mut years = Vec::with_capacity(wide.height());
        for idx in 0..wide.height() {
            let Some(raw) = dates.get(idx) else {
                return Err(PipelineError::Parse(
                    "null observation_date in the merged unemployment series".to_string(),
                ));
            };
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|err| {
                PipelineError::Parse(format!(
                    "observation_date `{raw}` is not a {DATE_FORMAT} date: {err}"
                ))
            })?;
            years.push(date.year());
        }
        years
    };

    let mut wide = wide.drop(OBSERVATION_DATE)?;

    if wide.width() != state_names.len() {
        return Err(PipelineError::Schema(format!(
            "state name mapping lists {} names but the unemployment series carry {} value columns",
            state_names.len(),
            wide.width()
        )));
    }

    let old_names: Vec<String> = wide
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    for (old_name, new_name) in old_names.iter().zip(state_names) {
        wide.rename(old_name, new_name.as_str().into())?;
    }

    reshape_long(&wide, state_names, &years)
}

fn ensure_observation_date(frame: &DataFrame) -> Result<()> {
    if frame.column(OBSERVATION_DATE).is_err() {
        return Err(PipelineError::Schema(format!(
            "unemployment series file has no `{OBSERVATION_DATE}` column"
        )));
    }
    Ok(())
}

/// One small frame per state column, stacked into the long form.
fn reshape_long(wide: &DataFrame, state_names: &[String], years: &[i32]) -> Result<DataFrame> {
    let year_series = Series::new("year".into(), years);

    let mut frames: Vec<DataFrame> = Vec::with_capacity(state_names.len());
    for state in state_names {
        let rate = wide
            .column(state.as_str())?
            .as_materialized_series()
            .cast(&DataType::Float64)?
            .with_name("rate".into());
        let state_col = Series::new("state".into(), vec![state.as_str(); wide.height()]);
        frames.push(DataFrame::new(vec![
            year_series.clone().into(),
            state_col.into(),
            rate.into(),
        ])?);
    }

    let mut iter = frames.into_iter();
    let Some(mut long) = iter.next() else {
        return Err(PipelineError::Schema(
            "state name mapping is empty".to_string(),
        ));
    };
    for frame in iter {
        long.vstack_mut(&frame)?;
    }
    Ok(long)
}
