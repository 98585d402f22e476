use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Free-text and leakage columns removed once the join is done. Dropped only
/// when present: the null-ratio pruning may already have taken one out.
const DROP_AFTER_JOIN: &[&str] = &[
    "emp_title",
    "issue_d",
    "loan_status",
    "url",
    "title",
    "zip_code",
    "policy_code",
    "earliest_cr_line",
    "initial_list_status",
    "last_pymnt_d",
    "last_credit_pull_d",
];

/// Left-joins the labeled loan table to the long-form rate table on
/// (`issue_year`, `addr_state`) = (`year`, `state`). Loans without a
/// matching rate row keep a null `rate`; the right-side keys do not survive
/// the join.
///
/// A left join must not change the loan row count. The rate table is built
/// with at most one row per (year, state); if that invariant is broken the
/// join fans out silently, so the row count is checked here.
pub fn join_unemployment(primary: DataFrame, rates: DataFrame) -> Result<DataFrame> {
    let expected_rows = primary.height();

    let mut args = JoinArgs::new(JoinType::Left);
    args.maintain_order = MaintainOrderJoin::Left;

    let joined = primary
        .lazy()
        .join(
            rates.lazy(),
            [col("issue_year"), col("addr_state")],
            [col("year"), col("state")],
            args,
        )
        .collect()?;

    if joined.height() != expected_rows {
        return Err(PipelineError::Schema(format!(
            "unemployment join changed the loan row count from {expected_rows} to {}; \
             the rate table has duplicate (year, state) keys",
            joined.height()
        )));
    }

    Ok(joined.drop_many(DROP_AFTER_JOIN.iter().copied()))
}
