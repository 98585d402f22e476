use std::collections::{BTreeSet, HashMap};

use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Grade letters in rank order; `grade_code` assigns 1..7 positionally.
const GRADES: &[&str] = &["A", "B", "C", "D", "E", "F", "G"];

/// Runs every column encoder. The encoders are independent of each other,
/// so their order is only cosmetic.
pub fn normalize_categoricals(df: DataFrame) -> Result<DataFrame> {
    let df = encode_term(df)?;
    let df = encode_grade(df)?;
    let df = encode_sub_grade(df)?;
    let df = encode_emp_length(df)?;
    let df = encode_flag(df, "pymnt_plan", "n", "y")?;
    let df = encode_flag(df, "hardship_flag", "N", "Y")?;
    encode_flag(df, "debt_settlement_flag", "N", "Y")
}

/// Truncates `term` to its leading numeric code ("36 months" -> "36"). The
/// column stays textual; numeric interpretation is the consumer's problem.
pub fn encode_term(df: DataFrame) -> Result<DataFrame> {
    let codes: Vec<Option<String>> = {
        let terms = df.column("term")?.str()?;
        (0..df.height())
            .map(|idx| {
                terms.get(idx).map(|term| {
                    let head: String = term.chars().take(3).collect();
                    head.trim().to_string()
                })
            })
            .collect()
    };

    replace_column(df, Series::new("term".into(), codes))
}

/// Fixed A..G -> 1..7 encoding. A letter outside that range encodes to a
/// null code rather than an error; callers that need a total encoding must
/// null-guard the column.
pub fn encode_grade(df: DataFrame) -> Result<DataFrame> {
    let codes: Vec<Option<i32>> = {
        let grades = df.column("grade")?.str()?;
        (0..df.height())
            .map(|idx| grades.get(idx).and_then(grade_code))
            .collect()
    };

    replace_column(df, Series::new("grade".into(), codes))
}

pub fn grade_code(letter: &str) -> Option<i32> {
    GRADES
        .iter()
        .position(|grade| *grade == letter)
        .map(|rank| rank as i32 + 1)
}

pub fn grade_letter(code: i32) -> Option<&'static str> {
    if code < 1 {
        return None;
    }
    GRADES.get(code as usize - 1).copied()
}

/// Dense-ranks the observed `sub_grade` values in lexicographic order,
/// 1..k. The mapping is batch-local: it is rebuilt from the distinct values
/// of each run, so codes are not comparable across different input batches.
pub fn encode_sub_grade(df: DataFrame) -> Result<DataFrame> {
    let codes: Vec<Option<i32>> = {
        let sub_grades = df.column("sub_grade")?.str()?;

        let mut distinct: BTreeSet<&str> = BTreeSet::new();
        for idx in 0..df.height() {
            if let Some(value) = sub_grades.get(idx) {
                distinct.insert(value);
            }
        }
        let ranks: HashMap<&str, i32> = distinct
            .iter()
            .enumerate()
            .map(|(rank, value)| (*value, rank as i32 + 1))
            .collect();

        (0..df.height())
            .map(|idx| sub_grades.get(idx).and_then(|value| ranks.get(value).copied()))
            .collect()
    };

    replace_column(df, Series::new("sub_grade".into(), codes))
}

/// Converts the textual employment length to years: "< 1 year" -> 0,
/// "10+ years" -> 10, "N years"/"N year" -> N. Nulls pass through; any
/// other text is a parse error.
pub fn encode_emp_length(df: DataFrame) -> Result<DataFrame> {
    let values: Vec<Option<f64>> = {
        let lengths = df.column("emp_length")?.str()?;
        let mut values = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            match lengths.get(idx) {
                Some(raw) => values.push(Some(parse_emp_length(raw)?)),
                None => values.push(None),
            }
        }
        values
    };

    replace_column(df, Series::new("emp_length".into(), values))
}

fn parse_emp_length(raw: &str) -> Result<f64> {
    let substituted = raw
        .replace("< 1 year", "0")
        .replace("10+ years", "10")
        .replace("years", "")
        .replace("year", "");

    substituted
        .trim()
        .parse::<f64>()
        .map_err(|_| PipelineError::Parse(format!("emp_length value `{raw}` is not recognized")))
}

/// Two-valued flag column to {0, 1}. A third value, or a null, means the
/// extract changed shape and is a schema error.
pub fn encode_flag(df: DataFrame, column: &str, negative: &str, positive: &str) -> Result<DataFrame> {
    let codes: Vec<i32> = {
        let flags = df.column(column)?.str()?;
        let mut codes = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let code = match flags.get(idx) {
                Some(value) if value == negative => 0,
                Some(value) if value == positive => 1,
                Some(other) => {
                    return Err(PipelineError::Schema(format!(
                        "column `{column}` contains unexpected value `{other}` \
                         (expected `{negative}` or `{positive}`)"
                    )))
                }
                None => {
                    return Err(PipelineError::Schema(format!(
                        "column `{column}` contains a null flag value"
                    )))
                }
            };
            codes.push(code);
        }
        codes
    };

    replace_column(df, Series::new(column.into(), codes))
}

fn replace_column(df: DataFrame, series: Series) -> Result<DataFrame> {
    let mut output = df;
    output.with_column(series)?;
    Ok(output)
}
