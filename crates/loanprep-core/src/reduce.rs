use polars::prelude::*;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Opaque row identifiers carried by the raw extract. They identify nothing
/// the model can use, so they go first.
pub const ID_COLUMNS: &[&str] = &["id", "member_id"];

/// A record without these fields cannot be labeled or joined.
pub const REQUIRED_COLUMNS: &[&str] = &["issue_d", "loan_status"];

/// Columns with strictly more than this fraction of nulls are dropped.
/// Exactly half null is retained.
const MAX_NULL_FRACTION: f64 = 0.5;

/// Reduces the raw loan table: drops identifier columns, keeps only rows
/// with a non-null issue date and status, then prunes columns whose null
/// fraction over the retained rows exceeds the threshold.
pub fn reduce_schema(df: DataFrame, id_columns: &[&str]) -> Result<DataFrame> {
    let mut reduced = df;

    for name in id_columns {
        if reduced.column(name).is_err() {
            return Err(PipelineError::Schema(format!(
                "expected identifier column `{name}` is missing from the loan table"
            )));
        }
        reduced = reduced.drop(name)?;
    }

    for name in REQUIRED_COLUMNS {
        if reduced.column(name).is_err() {
            return Err(PipelineError::Schema(format!(
                "expected column `{name}` is missing from the loan table"
            )));
        }
    }

    let reduced = reduced
        .lazy()
        .filter(
            col(REQUIRED_COLUMNS[0])
                .is_not_null()
                .and(col(REQUIRED_COLUMNS[1]).is_not_null()),
        )
        .collect()?;

    let rows = reduced.height();
    let mut keep: Vec<String> = Vec::with_capacity(reduced.width());
    for column in reduced.get_columns() {
        let null_fraction = if rows == 0 {
            0.0
        } else {
            column.null_count() as f64 / rows as f64
        };
        if null_fraction > MAX_NULL_FRACTION {
            debug!(column = %column.name(), null_fraction, "dropping sparse column");
        } else {
            keep.push(column.name().to_string());
        }
    }

    Ok(reduced.select(keep)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        df!(
            "id" => [1i64, 2, 3, 4],
            "member_id" => [10i64, 20, 30, 40],
            "issue_d" => [Some("Jan-2015"), None, Some("Mar-2016"), Some("Apr-2016")],
            "loan_status" => [Some("Fully Paid"), Some("Current"), None, Some("Default")],
            "loan_amnt" => [1000i64, 2000, 3000, 4000],
        )
        .unwrap()
    }

    #[test]
    fn drops_identifier_columns_and_null_required_rows() {
        let reduced = reduce_schema(raw_frame(), ID_COLUMNS).unwrap();

        assert!(reduced.column("id").is_err());
        assert!(reduced.column("member_id").is_err());
        // Rows 2 and 3 are missing a required field.
        assert_eq!(reduced.height(), 2);
        assert_eq!(
            reduced.column("issue_d").unwrap().str().unwrap().get(0),
            Some("Jan-2015")
        );
    }

    #[test]
    fn missing_identifier_column_is_a_schema_error() {
        let df = df!("issue_d" => ["Jan-2015"], "loan_status" => ["Current"]).unwrap();
        let err = reduce_schema(df, ID_COLUMNS).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(msg) if msg.contains("`id`")));
    }

    #[test]
    fn prunes_columns_over_the_null_threshold() {
        let df = df!(
            "id" => [1i64, 2, 3, 4],
            "member_id" => [1i64, 2, 3, 4],
            "issue_d" => ["Jan-2015", "Feb-2015", "Mar-2015", "Apr-2015"],
            "loan_status" => ["Current", "Current", "Current", "Current"],
            "mostly_null" => [Some(1i64), None, None, None],
        )
        .unwrap();

        let reduced = reduce_schema(df, ID_COLUMNS).unwrap();
        assert!(reduced.column("mostly_null").is_err());
    }

    #[test]
    fn retains_a_column_with_exactly_half_nulls() {
        let df = df!(
            "id" => [1i64, 2, 3, 4],
            "member_id" => [1i64, 2, 3, 4],
            "issue_d" => ["Jan-2015", "Feb-2015", "Mar-2015", "Apr-2015"],
            "loan_status" => ["Current", "Current", "Current", "Current"],
            "half_null" => [Some(1i64), Some(2), None, None],
        )
        .unwrap();

        let reduced = reduce_schema(df, ID_COLUMNS).unwrap();
        assert!(reduced.column("half_null").is_ok());
    }

    #[test]
    fn null_fraction_is_computed_over_retained_rows() {
        // Two of the four raw rows are dropped by the required-field filter.
        // `sparse` is 75% null over the raw rows but only 50% over the
        // retained ones, so it survives.
        let df = df!(
            "id" => [1i64, 2, 3, 4],
            "member_id" => [1i64, 2, 3, 4],
            "issue_d" => [Some("Jan-2015"), None, None, Some("Apr-2015")],
            "loan_status" => ["Current", "Current", "Current", "Current"],
            "sparse" => [Some(1i64), None, None, None],
        )
        .unwrap();

        let reduced = reduce_schema(df, ID_COLUMNS).unwrap();
        assert_eq!(reduced.height(), 2);
        assert!(reduced.column("sparse").is_ok());
    }
}
