//! Pivot aggregation.
//!
//! Turns a filtered table into a 2-D count/sum grid keyed by a bucket
//! category (rows) and the fixed maandjaar ordering (columns). Aggregation
//! is deterministic and invariant under row permutation: everything is
//! accumulated into keyed maps first and materialized in declared order.

use crate::error::{DashboardError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The twelve Dutch month abbreviations, in calendar order.
pub const MONTHS: [&str; 12] = [
    "jan", "feb", "mrt", "apr", "mei", "jun", "jul", "aug", "sep", "okt", "nov", "dec",
];

/// Sort key for a "mmm-YY" label: (year, month number).
///
/// Unrecognized labels get no key and sort after every recognized one,
/// rather than erroring.
pub fn month_sort_key(label: &str) -> Option<(i32, u8)> {
    let (month_part, year_part) = label.trim().split_once('-')?;
    let month = MONTHS
        .iter()
        .position(|&m| m.eq_ignore_ascii_case(month_part))? as u8
        + 1;
    let year: i32 = year_part.parse().ok()?;
    // Two-digit years are from this century.
    let year = if year < 100 { 2000 + year } else { year };
    Some((year, month))
}

/// Expand observed labels into the declared column order.
///
/// For every year that appears in a recognized label, all twelve labels of
/// that year participate in calendar order, present in the data or not.
/// Unrecognized labels are appended afterwards in first-seen order.
pub fn expand_month_order<I, S>(observed: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut years: Vec<i32> = Vec::new();
    let mut unrecognized: Vec<String> = Vec::new();

    for label in observed {
        let label = label.as_ref();
        match month_sort_key(label) {
            Some((year, _)) => {
                if !years.contains(&year) {
                    years.push(year);
                }
            }
            None => {
                if !unrecognized.iter().any(|u| u == label) {
                    unrecognized.push(label.to_string());
                }
            }
        }
    }
    years.sort_unstable();

    let mut order = Vec::with_capacity(years.len() * 12 + unrecognized.len());
    for year in years {
        for month in MONTHS {
            order.push(format!("{}-{:02}", month, year % 100));
        }
    }
    order.extend(unrecognized);
    order
}

/// Aggregation function. Both are order-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AggFn {
    /// Count of matching rows; absent combinations are zero.
    #[default]
    Count,
    /// Sum of a value column; absent combinations are "no value".
    Sum,
}

/// What to pivot: row key, column key, and (for Sum) the value column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotSpec {
    /// Categorical row key (the bucket label).
    pub row_key: String,
    /// Categorical column key with the fixed maandjaar ordering.
    pub column_key: String,
    /// Value column; required for `Sum`, ignored for `Count`.
    pub value: Option<String>,
    pub agg: AggFn,
}

impl PivotSpec {
    pub fn count(row_key: impl Into<String>, column_key: impl Into<String>) -> Self {
        Self {
            row_key: row_key.into(),
            column_key: column_key.into(),
            value: None,
            agg: AggFn::Count,
        }
    }

    pub fn sum(
        row_key: impl Into<String>,
        column_key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            row_key: row_key.into(),
            column_key: column_key.into(),
            value: Some(value.into()),
            agg: AggFn::Sum,
        }
    }
}

/// A 2-D aggregate grid with declared column ordering.
///
/// `cells[r][c]` is `None` for a (row, column) combination with no data
/// under `Sum`; under `Count` absent combinations are `Some(0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
    pub agg: AggFn,
}

impl PivotTable {
    /// Cell lookup by labels.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.column_labels.iter().position(|l| l == column)?;
        self.cells[r][c]
    }

    /// Total over all cells. Zero for an empty table.
    pub fn total(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .filter_map(|cell| *cell)
            .sum()
    }

    /// True when the table holds no populated cell.
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }
}

/// Read a column as strings, nulls preserved.
fn string_keys(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(column)
        .map_err(|_| DashboardError::ColumnNotFound(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)?;

    Ok(series
        .str()?
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect())
}

/// Pivot with an externally supplied column ordering.
///
/// Rows with a null row key or column key are skipped; for `Sum`, rows
/// with a null value are also skipped (missing is not zero). Row labels
/// are sorted lexically; column labels follow `column_order`, with labels
/// observed in the data but absent from the order appended at the end.
pub fn pivot_with_order(
    df: &DataFrame,
    spec: &PivotSpec,
    column_order: &[String],
) -> Result<PivotTable> {
    let row_keys = string_keys(df, &spec.row_key)?;
    let column_keys = string_keys(df, &spec.column_key)?;

    let values: Option<Vec<Option<f64>>> = match spec.agg {
        AggFn::Count => None,
        AggFn::Sum => {
            let value_col = spec.value.as_deref().ok_or_else(|| {
                DashboardError::UnsupportedAggregation {
                    column: spec.row_key.clone(),
                    role: "sum".to_string(),
                    reason: "no value column supplied".to_string(),
                }
            })?;
            let series = df
                .column(value_col)
                .map_err(|_| DashboardError::ColumnNotFound(value_col.to_string()))?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            Some(series.f64()?.into_iter().collect())
        }
    };

    // Accumulate into keyed maps; insertion order never matters.
    let mut sums: HashMap<(String, String), f64> = HashMap::new();
    let mut counts: HashMap<(String, String), u64> = HashMap::new();
    let mut row_labels: Vec<String> = Vec::new();
    let mut extra_columns: Vec<String> = Vec::new();

    for i in 0..df.height() {
        let (Some(row), Some(col)) = (&row_keys[i], &column_keys[i]) else {
            continue;
        };
        if let Some(values) = &values {
            match values[i] {
                Some(v) => *sums.entry((row.clone(), col.clone())).or_insert(0.0) += v,
                None => continue,
            }
        } else {
            *counts.entry((row.clone(), col.clone())).or_insert(0) += 1;
        }

        if !row_labels.contains(row) {
            row_labels.push(row.clone());
        }
        if !column_order.contains(col) && !extra_columns.contains(col) {
            extra_columns.push(col.clone());
        }
    }

    row_labels.sort();
    let mut column_labels: Vec<String> = column_order.to_vec();
    column_labels.extend(extra_columns);

    let cells = row_labels
        .iter()
        .map(|row| {
            column_labels
                .iter()
                .map(|col| {
                    let key = (row.clone(), col.clone());
                    match spec.agg {
                        AggFn::Count => Some(*counts.get(&key).unwrap_or(&0) as f64),
                        AggFn::Sum => sums.get(&key).copied(),
                    }
                })
                .collect()
        })
        .collect();

    Ok(PivotTable {
        row_labels,
        column_labels,
        cells,
        agg: spec.agg,
    })
}

/// Pivot with the maandjaar ordering derived from the observed labels.
pub fn pivot(df: &DataFrame, spec: &PivotSpec) -> Result<PivotTable> {
    let observed = string_keys(df, &spec.column_key)?;
    let order = expand_month_order(observed.iter().flatten());
    pivot_with_order(df, spec, &order)
}
