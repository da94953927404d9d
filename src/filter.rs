//! Range filtering.
//!
//! The heart of every view: given a table and a set of inclusive
//! (column, lower, upper) constraints, return the subset of rows satisfying
//! all of them. The operation is a pure function of (table, bounds) and is
//! idempotent, so interactive controls can re-run it on every change.
//!
//! Policy: both endpoints are inclusive, and rows with a null in a
//! filtered column are excluded by the filter itself rather than in a
//! separate pre-pass.

use crate::error::{DashboardError, Result};
use chrono::NaiveDateTime;
use polars::prelude::*;

/// An inclusive range bound, typed to match the field it applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Numeric field (power, energy, occupancy, price, ...).
    Numeric { lo: f64, hi: f64 },
    /// Integer hour-of-day field.
    Hour { lo: i64, hi: i64 },
    /// Datetime field, compared at full timestamp precision.
    Date { lo: NaiveDateTime, hi: NaiveDateTime },
}

impl Bound {
    fn validate(&self, field: &str) -> Result<()> {
        let (ok, lower, upper) = match self {
            Bound::Numeric { lo, hi } => (lo <= hi, lo.to_string(), hi.to_string()),
            Bound::Hour { lo, hi } => (lo <= hi, lo.to_string(), hi.to_string()),
            Bound::Date { lo, hi } => (lo <= hi, lo.to_string(), hi.to_string()),
        };
        if ok {
            Ok(())
        } else {
            Err(DashboardError::InvalidBounds {
                field: field.to_string(),
                lower,
                upper,
            })
        }
    }
}

/// One (column, inclusive-lower, inclusive-upper) constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConstraint {
    pub column: String,
    pub bound: Bound,
}

impl RangeConstraint {
    pub fn numeric(column: impl Into<String>, lo: f64, hi: f64) -> Self {
        Self {
            column: column.into(),
            bound: Bound::Numeric { lo, hi },
        }
    }

    pub fn hour(column: impl Into<String>, lo: i64, hi: i64) -> Self {
        Self {
            column: column.into(),
            bound: Bound::Hour { lo, hi },
        }
    }

    pub fn date(column: impl Into<String>, lo: NaiveDateTime, hi: NaiveDateTime) -> Self {
        Self {
            column: column.into(),
            bound: Bound::Date { lo, hi },
        }
    }
}

/// Boolean mask for one constraint. Null values never satisfy a bound.
fn constraint_mask(df: &DataFrame, constraint: &RangeConstraint) -> Result<BooleanChunked> {
    constraint.bound.validate(&constraint.column)?;

    let series = df
        .column(&constraint.column)
        .map_err(|_| DashboardError::ColumnNotFound(constraint.column.clone()))?
        .as_materialized_series();

    let in_range = match &constraint.bound {
        Bound::Numeric { lo, hi } => {
            let floats = series.cast(&DataType::Float64)?;
            floats.gt_eq(*lo)? & floats.lt_eq(*hi)?
        }
        Bound::Hour { lo, hi } => {
            let ints = series.cast(&DataType::Int64)?;
            ints.gt_eq(*lo)? & ints.lt_eq(*hi)?
        }
        Bound::Date { lo, hi } => {
            // Datetime(ms) compares as epoch milliseconds.
            let millis = series.cast(&DataType::Int64)?;
            let lo_ms = lo.and_utc().timestamp_millis();
            let hi_ms = hi.and_utc().timestamp_millis();
            millis.gt_eq(lo_ms)? & millis.lt_eq(hi_ms)?
        }
    };

    Ok(in_range & series.is_not_null())
}

/// Return the subset of rows satisfying the conjunction of all constraints.
///
/// An empty result is valid and flows through to the renderer, which shows
/// a "no data" placeholder instead of a plot.
pub fn apply_constraints(df: &DataFrame, constraints: &[RangeConstraint]) -> Result<DataFrame> {
    let mut mask = BooleanChunked::full("mask".into(), true, df.height());

    for constraint in constraints {
        mask = mask & constraint_mask(df, constraint)?;
    }

    Ok(df.filter(&mask)?)
}

/// Observed extent of a field, used to seed interactive range controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Numeric { min: f64, max: f64 },
    Hour { min: i64, max: i64 },
    Date { min: NaiveDateTime, max: NaiveDateTime },
}

impl Extent {
    /// The bound selecting the full observed range.
    pub fn full_bound(&self) -> Bound {
        match *self {
            Extent::Numeric { min, max } => Bound::Numeric { lo: min, hi: max },
            Extent::Hour { min, max } => Bound::Hour { lo: min, hi: max },
            Extent::Date { min, max } => Bound::Date { lo: min, hi: max },
        }
    }
}

/// Which extent flavor to derive for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentKind {
    Numeric,
    Hour,
    Date,
}

/// Observed min/max of a column over its non-null values.
pub fn field_extent(df: &DataFrame, column: &str, kind: ExtentKind) -> Result<Extent> {
    let series = df
        .column(column)
        .map_err(|_| DashboardError::ColumnNotFound(column.to_string()))?
        .as_materialized_series();

    let empty = || DashboardError::EmptyDomain(column.to_string());

    match kind {
        ExtentKind::Numeric => {
            let floats = series.cast(&DataType::Float64)?;
            let min = floats.min::<f64>()?.ok_or_else(empty)?;
            let max = floats.max::<f64>()?.ok_or_else(empty)?;
            Ok(Extent::Numeric { min, max })
        }
        ExtentKind::Hour => {
            let ints = series.cast(&DataType::Int64)?;
            let min = ints.min::<i64>()?.ok_or_else(empty)?;
            let max = ints.max::<i64>()?.ok_or_else(empty)?;
            Ok(Extent::Hour { min, max })
        }
        ExtentKind::Date => {
            let millis = series.cast(&DataType::Int64)?;
            let min = millis.min::<i64>()?.ok_or_else(empty)?;
            let max = millis.max::<i64>()?.ok_or_else(empty)?;
            let to_dt = |ms: i64| {
                chrono::DateTime::from_timestamp_millis(ms)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(empty)
            };
            Ok(Extent::Date {
                min: to_dt(min)?,
                max: to_dt(max)?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn session_frame() -> DataFrame {
        df![
            "vermogen_w" => [Some(40.0f64), Some(60.0), None, Some(55.0)],
            "uur" => [14i64, 9, 12, 23],
            "blok" => ["middag", "ochtend", "middag", "avond"],
        ]
        .unwrap()
    }

    #[test]
    fn test_conjunction_of_bounds() {
        // Power in [50, 70] plus hour in [0, 23] keeps only the 60 W row
        // and the 55 W row.
        let df = session_frame();
        let filtered = apply_constraints(
            &df,
            &[
                RangeConstraint::numeric("vermogen_w", 50.0, 70.0),
                RangeConstraint::hour("uur", 0, 23),
            ],
        )
        .unwrap();

        assert_eq!(filtered.height(), 2);
        let hours = filtered.column("uur").unwrap().as_materialized_series();
        assert_eq!(hours.i64().unwrap().get(0), Some(9));
        assert_eq!(hours.i64().unwrap().get(1), Some(23));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let df = session_frame();
        let filtered =
            apply_constraints(&df, &[RangeConstraint::numeric("vermogen_w", 40.0, 60.0)]).unwrap();
        // 40 and 60 are both kept.
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let df = session_frame();
        let constraints = [RangeConstraint::numeric("vermogen_w", 50.0, 70.0)];

        let once = apply_constraints(&df, &constraints).unwrap();
        let twice = apply_constraints(&once, &constraints).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_full_range_drops_only_missing_values() {
        let df = session_frame();
        let extent = field_extent(&df, "vermogen_w", ExtentKind::Numeric).unwrap();
        let constraint = RangeConstraint {
            column: "vermogen_w".to_string(),
            bound: extent.full_bound(),
        };

        let filtered = apply_constraints(&df, &[constraint]).unwrap();
        // Four rows in, one has a null power value.
        assert_eq!(filtered.height(), 3);
        assert_eq!(
            filtered
                .column("vermogen_w")
                .unwrap()
                .as_materialized_series()
                .null_count(),
            0
        );
    }

    #[test]
    fn test_empty_result_is_valid() {
        let df = session_frame();
        let filtered =
            apply_constraints(&df, &[RangeConstraint::numeric("vermogen_w", 500.0, 600.0)])
                .unwrap();
        assert_eq!(filtered.height(), 0);
        assert_eq!(filtered.width(), df.width());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let df = session_frame();
        let err = apply_constraints(&df, &[RangeConstraint::numeric("vermogen_w", 70.0, 50.0)])
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidBounds { .. }));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let df = session_frame();
        let err =
            apply_constraints(&df, &[RangeConstraint::numeric("bestaat_niet", 0.0, 1.0)])
                .unwrap_err();
        assert!(matches!(err, DashboardError::ColumnNotFound(_)));
    }

    #[test]
    fn test_date_bounds_use_full_timestamp_precision() {
        let jan5_1400 = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let jan5_1500 = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();

        let millis = Series::new(
            "gestart".into(),
            vec![
                Some(jan5_1400.and_utc().timestamp_millis()),
                Some(jan5_1500.and_utc().timestamp_millis()),
                None,
            ],
        )
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
        let df = DataFrame::new(vec![millis.into()]).unwrap();

        // A window ending 14:30 must exclude the 15:00 session even though
        // both fall on the same day.
        let hi = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let filtered = apply_constraints(
            &df,
            &[RangeConstraint::date("gestart", jan5_1400, hi)],
        )
        .unwrap();
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn test_field_extent_empty_domain() {
        let df = df!["vermogen_w" => [None::<f64>, None]].unwrap();
        let err = field_extent(&df, "vermogen_w", ExtentKind::Numeric).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyDomain(_)));
    }

    #[test]
    fn test_field_extent_observed_min_max() {
        let df = session_frame();
        let extent = field_extent(&df, "uur", ExtentKind::Hour).unwrap();
        assert_eq!(extent, Extent::Hour { min: 9, max: 23 });
    }
}
