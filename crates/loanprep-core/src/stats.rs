//! Thin statistical consumers of the clean table. Everything heavier (PCA,
//! clustering) lives outside this crate and takes the table as-is.

use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// The binary outcome column produced by the pipeline.
pub const TARGET: &str = "default";

/// Splits the clean table into a feature table and the `default` target.
pub fn split_target(df: DataFrame) -> Result<(DataFrame, Series)> {
    let target = df
        .column(TARGET)
        .map_err(|_| {
            PipelineError::Schema(format!("expected target column `{TARGET}` in the clean table"))
        })?
        .as_materialized_series()
        .clone();
    let features = df.drop(TARGET)?;
    Ok((features, target))
}

/// Replaces values further than `z_threshold` population standard deviations
/// from a column's mean with that mean. Non-numeric columns pass through
/// untouched, as do constant and all-null columns.
pub fn cap_outliers(df: DataFrame, z_threshold: f64) -> Result<DataFrame> {
    let mut output = df;

    for name in output.get_column_names_owned() {
        let capped: Option<Series> = {
            let column = output.column(&name)?;
            if !column.dtype().is_primitive_numeric() {
                None
            } else {
                let series = column.as_materialized_series().cast(&DataType::Float64)?;
                let values = series.f64()?;
                match (values.mean(), values.std(0)) {
                    (Some(mean), Some(std)) if std > 0.0 => {
                        let clipped: Float64Chunked = values.apply_values(|value| {
                            if ((value - mean) / std).abs() > z_threshold {
                                mean
                            } else {
                                value
                            }
                        });
                        Some(clipped.into_series().with_name(name.clone()))
                    }
                    _ => None,
                }
            }
        };

        if let Some(series) = capped {
            output.with_column(series)?;
        }
    }

    Ok(output)
}

/// Caps outliers in the feature columns only. The `default` label is not a
/// feature: with a low default rate the 1-labels sit beyond any sane z
/// threshold and would be rewritten to the column mean, so the label is
/// detached before capping and re-attached unchanged.
pub fn cap_feature_outliers(df: DataFrame, z_threshold: f64) -> Result<DataFrame> {
    let (features, target) = split_target(df)?;
    let mut capped = cap_outliers(features, z_threshold)?;
    capped.with_column(target)?;
    Ok(capped)
}

/// Ranks numeric feature columns by the absolute point-biserial correlation
/// (Pearson r against the binary target), median-filling nulls first.
/// Returns (column, |r|) pairs sorted descending.
pub fn point_biserial(features: &DataFrame, target: &Series) -> Result<Vec<(String, f64)>> {
    let target = target.cast(&DataType::Float64)?;
    let target_values = target.f64()?;
    if target_values.null_count() > 0 {
        return Err(PipelineError::Schema(
            "target column contains null labels".to_string(),
        ));
    }
    let target_values: Vec<f64> = target_values.into_no_null_iter().collect();

    let mut scores: Vec<(String, f64)> = Vec::new();
    for column in features.get_columns() {
        if !column.dtype().is_primitive_numeric() {
            continue;
        }
        let series = column.as_materialized_series().cast(&DataType::Float64)?;
        let values = series.f64()?;
        let Some(median) = values.median() else {
            continue;
        };
        let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(median)).collect();
        if let Some(r) = pearson(&filled, &target_values) {
            scores.push((column.name().to_string(), r.abs()));
        }
    }

    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(scores)
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.is_empty() {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
