//! Per-column coercion of raw CSV values into typed series.
//!
//! All coercions are permissive: a value that cannot be parsed becomes null
//! rather than an error, so that one bad row never takes down a view. Rows
//! that end up null in a required column are excluded later, by the view
//! that actually needs the column.

use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Markers the source exports use for absent values.
const MISSING_MARKERS: [&str; 5] = ["", "n/a", "na", "null", "onbekend"];

/// Day-first timestamp formats seen across the source exports.
const DATETIME_FORMATS: [&str; 4] = [
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Day-first date-only formats, parsed as midnight.
const DATE_FORMATS: [&str; 2] = ["%d-%m-%Y", "%d/%m/%Y"];

fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.iter().any(|&m| lower == m)
}

/// Parse a decimal-comma numeric string ("12,5" -> 12.5).
///
/// Thousands separators are not expected in these exports; the comma is the
/// decimal mark. Anything that still fails to parse is missing, not zero.
pub fn parse_decimal_comma(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if is_missing_marker(trimmed) {
        return None;
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}

/// Parse a day-first timestamp string into a naive datetime.
pub fn parse_dayfirst_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if is_missing_marker(trimmed) {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Check if a DataType is numeric (integer or float).
fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Convert a string series with decimal-comma values to Float64.
pub fn decimal_comma_to_f64(series: &Series) -> Result<Series> {
    // Already numeric (the export sometimes ships plain decimals).
    if is_numeric_dtype(series.dtype()) {
        return Ok(series.cast(&DataType::Float64)?);
    }

    let str_series = series.str()?;
    let mut result_vec: Vec<Option<f64>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        result_vec.push(opt_val.and_then(parse_decimal_comma));
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Convert a string series with day-first timestamps to Datetime(ms).
pub fn dayfirst_to_datetime(series: &Series) -> Result<Series> {
    let str_series = series.str()?;
    let mut millis: Vec<Option<i64>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        millis.push(
            opt_val
                .and_then(parse_dayfirst_datetime)
                .map(|dt| dt.and_utc().timestamp_millis()),
        );
    }

    let millis_series = Series::new(series.name().clone(), millis);
    Ok(millis_series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

/// Convert a series to an hour-of-day column (Int64, nulled outside 0-23).
pub fn to_hour_of_day(series: &Series) -> Result<Series> {
    let as_float = decimal_comma_to_f64(series)?;
    let floats = as_float.f64()?;
    let mut hours: Vec<Option<i64>> = Vec::with_capacity(floats.len());

    for opt_val in floats.into_iter() {
        hours.push(opt_val.and_then(|v| {
            let h = v as i64;
            ((0..=23).contains(&h) && v.fract() == 0.0).then_some(h)
        }));
    }

    Ok(Series::new(series.name().clone(), hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_decimal_comma("12,5"), Some(12.5));
        assert_eq!(parse_decimal_comma(" 7,25 "), Some(7.25));
        assert_eq!(parse_decimal_comma("40"), Some(40.0));
        assert_eq!(parse_decimal_comma("abc"), None);
        assert_eq!(parse_decimal_comma(""), None);
        assert_eq!(parse_decimal_comma("onbekend"), None);
    }

    #[test]
    fn test_parse_dayfirst_datetime() {
        let dt = parse_dayfirst_datetime("05-01-2024 14:30").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!((dt.hour(), dt.minute()), (14, 30));

        // Date-only parses as midnight.
        let d = parse_dayfirst_datetime("10/02/2024").unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(d.hour(), 0);

        assert_eq!(parse_dayfirst_datetime("not a date"), None);
        // Month-first would put day 13 in the month slot; must not parse.
        assert_eq!(parse_dayfirst_datetime("2024-13-01"), None);
    }

    #[test]
    fn test_decimal_comma_to_f64_malformed_is_null_not_zero() {
        let series = Series::new("verbruik_wh".into(), &["12,5", "abc", "0", ""]);
        let result = decimal_comma_to_f64(&series).unwrap();

        assert_eq!(result.dtype(), &DataType::Float64);
        let floats = result.f64().unwrap();
        assert_eq!(floats.get(0), Some(12.5));
        assert_eq!(floats.get(1), None);
        assert_eq!(floats.get(2), Some(0.0));
        assert_eq!(floats.get(3), None);
    }

    #[test]
    fn test_decimal_comma_passthrough_for_numeric_series() {
        let series = Series::new("vermogen_w".into(), &[40.0f64, 60.0]);
        let result = decimal_comma_to_f64(&series).unwrap();
        assert_eq!(result.f64().unwrap().get(1), Some(60.0));
    }

    #[test]
    fn test_dayfirst_to_datetime_invalid_becomes_null() {
        let series = Series::new(
            "gestart".into(),
            &[Some("05-01-2024 14:00"), Some("garbage"), None],
        );
        let result = dayfirst_to_datetime(&series).unwrap();

        assert!(matches!(result.dtype(), DataType::Datetime(_, _)));
        assert_eq!(result.null_count(), 2);
    }

    #[test]
    fn test_to_hour_of_day_range_check() {
        let series = Series::new("uur".into(), &["14", "9", "24", "-1", "abc"]);
        let result = to_hour_of_day(&series).unwrap();

        let hours = result.i64().unwrap();
        assert_eq!(hours.get(0), Some(14));
        assert_eq!(hours.get(1), Some(9));
        assert_eq!(hours.get(2), None);
        assert_eq!(hours.get(3), None);
        assert_eq!(hours.get(4), None);
    }
}
