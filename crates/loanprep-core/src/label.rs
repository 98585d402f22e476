use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Statuses that count as a defaulted loan. Every other status value,
/// including ones this list has never seen, labels as 0.
pub const DEFAULT_STATUSES: &[&str] = &[
    "Charged Off",
    "Default",
    "Late (31-120 days)",
    "In Grace Period",
    "Late (16-30 days)",
];

/// Appends the binary `default` label derived from `loan_status`.
pub fn derive_default(df: DataFrame) -> Result<DataFrame> {
    let labels: Vec<i32> = {
        let status = df.column("loan_status")?.str()?;
        (0..df.height())
            .map(|idx| {
                let is_default = status
                    .get(idx)
                    .map(|value| DEFAULT_STATUSES.contains(&value))
                    .unwrap_or(false);
                i32::from(is_default)
            })
            .collect()
    };

    let mut output = df;
    output.with_column(Series::new("default".into(), labels))?;
    Ok(output)
}

/// Appends `issue_year`, parsed from the trailing four characters of
/// `issue_d` (e.g. "Jan-2015" -> 2015).
pub fn derive_issue_year(df: DataFrame) -> Result<DataFrame> {
    let years: Vec<i32> = {
        let issue_d = df.column("issue_d")?.str()?;
        let mut years = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let Some(raw) = issue_d.get(idx) else {
                return Err(PipelineError::Parse(
                    "null issue_d survived the required-field filter".to_string(),
                ));
            };
            years.push(parse_issue_year(raw)?);
        }
        years
    };

    let mut output = df;
    output.with_column(Series::new("issue_year".into(), years))?;
    Ok(output)
}

fn parse_issue_year(raw: &str) -> Result<i32> {
    let tail = raw
        .len()
        .checked_sub(4)
        .and_then(|start| raw.get(start..))
        .filter(|tail| tail.chars().all(|c| c.is_ascii_digit()));

    let Some(tail) = tail else {
        return Err(PipelineError::Parse(format!(
            "issue_d value `{raw}` does not end in a four-digit year"
        )));
    };

    tail.parse::<i32>().map_err(|_| {
        PipelineError::Parse(format!("issue_d value `{raw}` does not end in a four-digit year"))
    })
}
