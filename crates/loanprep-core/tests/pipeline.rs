use std::path::PathBuf;

use loanprep_core::error::PipelineError;
use loanprep_core::pipeline::{preprocess, Sources};
use loanprep_core::stats;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn sources() -> Sources {
    Sources {
        loans: fixture("loans.csv"),
        unemployment: vec![
            fixture("unemployment_rate_0.csv"),
            fixture("unemployment_rate_1.csv"),
        ],
        state_names: fixture("states.json"),
    }
}

#[test]
fn end_to_end_produces_the_expected_clean_table() {
    let clean = preprocess(&sources()).unwrap();

    // Two raw rows are missing a required field; the other six survive
    // every later stage.
    assert_eq!(clean.height(), 6);

    // Identifier, sparse, and free-text columns are gone; the geographic
    // code and the exactly-half-null column survive.
    for dropped in ["id", "member_id", "desc", "emp_title", "url", "issue_d", "loan_status"] {
        assert!(clean.column(dropped).is_err(), "column {dropped} should be dropped");
    }
    assert!(clean.column("addr_state").is_ok());
    assert!(clean.column("half_null").is_ok());

    let default = clean.column("default").unwrap().i32().unwrap();
    let expected_default = [0, 1, 1, 0, 1, 1];
    for (idx, want) in expected_default.iter().enumerate() {
        assert_eq!(default.get(idx), Some(*want), "default at row {idx}");
    }

    let issue_year = clean.column("issue_year").unwrap().i32().unwrap();
    let expected_years = [2015, 2016, 2015, 2017, 2016, 2015];
    for (idx, want) in expected_years.iter().enumerate() {
        assert_eq!(issue_year.get(idx), Some(*want), "issue_year at row {idx}");
    }

    let term = clean.column("term").unwrap().str().unwrap();
    assert_eq!(term.get(0), Some("36"));
    assert_eq!(term.get(1), Some("60"));

    let grade = clean.column("grade").unwrap().i32().unwrap();
    let expected_grades = [1, 2, 3, 1, 7, 2];
    for (idx, want) in expected_grades.iter().enumerate() {
        assert_eq!(grade.get(idx), Some(*want), "grade at row {idx}");
    }

    // Distinct sub_grades sorted: A1, A5, B1, C2, G5.
    let sub_grade = clean.column("sub_grade").unwrap().i32().unwrap();
    let expected_sub_grades = [2, 3, 4, 1, 5, 3];
    for (idx, want) in expected_sub_grades.iter().enumerate() {
        assert_eq!(sub_grade.get(idx), Some(*want), "sub_grade at row {idx}");
    }

    let emp_length = clean.column("emp_length").unwrap().f64().unwrap();
    assert_eq!(emp_length.get(0), Some(10.0));
    assert_eq!(emp_length.get(1), Some(0.0));
    assert_eq!(emp_length.get(2), Some(5.0));
    assert_eq!(emp_length.get(3), Some(1.0));
    assert_eq!(emp_length.get(4), None);
    assert_eq!(emp_length.get(5), Some(2.0));

    // CA-2015 and NY-2016/NY-2015 have observations; TX-2015 and CA-2017
    // exist only as outer-join null fills, and WA has no rate rows at all.
    let rate = clean.column("rate").unwrap().f64().unwrap();
    assert_eq!(rate.get(0), Some(6.2));
    assert_eq!(rate.get(1), Some(5.1));
    assert_eq!(rate.get(2), None);
    assert_eq!(rate.get(3), None);
    assert_eq!(rate.get(4), None);
    assert_eq!(rate.get(5), Some(5.8));

    let pymnt_plan = clean.column("pymnt_plan").unwrap().i32().unwrap();
    assert_eq!(pymnt_plan.get(2), Some(1));
    assert_eq!(pymnt_plan.get(0), Some(0));

    let hardship = clean.column("hardship_flag").unwrap().i32().unwrap();
    assert_eq!(hardship.get(4), Some(1));

    let settlement = clean.column("debt_settlement_flag").unwrap().i32().unwrap();
    assert_eq!(settlement.get(5), Some(1));
}

#[test]
fn clean_table_feeds_the_correlation_ranking() {
    let clean = preprocess(&sources()).unwrap();
    let (features, target) = stats::split_target(clean).unwrap();
    let scores = stats::point_biserial(&features, &target).unwrap();

    assert!(!scores.is_empty());
    assert!(scores.iter().any(|(feature, _)| feature == "loan_amnt"));
    // Sorted descending by |r|.
    for pair in scores.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
}

#[test]
fn missing_loan_file_fails_with_io_error() {
    let mut sources = sources();
    sources.loans = fixture("no_such_file.csv");

    let err = preprocess(&sources).unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
}

#[test]
fn wrong_state_name_count_fails_with_schema_error() {
    let mut sources = sources();
    // Only the first series file: two value columns for three mapped names.
    sources.unemployment = vec![fixture("unemployment_rate_0.csv")];

    let err = preprocess(&sources).unwrap_err();
    assert!(matches!(err, PipelineError::Schema(_)));
}
