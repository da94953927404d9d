//! Table loading.
//!
//! This module reads the delimited source exports into typed DataFrames:
//! a generic CSV reader plus one schema-application function per dataset
//! (sessions, vehicles, provinces, stations). Coercions are permissive;
//! see [`coerce`].

pub mod cache;
pub mod coerce;
pub mod fetch;

pub use cache::DatasetCache;
pub use fetch::ensure_local_copy;

use crate::error::{DashboardError, Result};
use crate::schema;
use coerce::{dayfirst_to_datetime, decimal_comma_to_f64, to_hour_of_day};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Read a delimited CSV into a DataFrame.
///
/// A missing file is a fatal, per-view error; everything else polars can
/// recover from (ragged quoting, odd encodings of individual fields) is
/// left to the per-column coercions.
pub fn load_table(path: &Path, delimiter: u8) -> Result<DataFrame> {
    if !path.exists() {
        return Err(DashboardError::SourceNotFound(path.to_path_buf()));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_quote_char(Some(b'"')),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    info!(
        "Loaded {} ({} rows x {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Apply a coercion to a named column, replacing it in the frame.
fn coerce_column<F>(df: &mut DataFrame, name: &str, coercion: F) -> Result<()>
where
    F: Fn(&Series) -> Result<Series>,
{
    let series = df
        .column(name)
        .map_err(|_| DashboardError::ColumnNotFound(name.to_string()))?
        .as_materialized_series()
        .clone();
    let coerced = coercion(&series)?;
    df.with_column(coerced)?;
    Ok(())
}

/// Load the charging-session table and apply its schema.
///
/// Timestamps are day-first, energy and occupancy are decimal-comma
/// encoded, and the hour column is clamped to 0-23. Rows where both
/// timestamps parsed but the session ends before it starts are dropped.
pub fn load_sessions(path: &Path, delimiter: u8) -> Result<DataFrame> {
    let mut df = load_table(path, delimiter)?;

    coerce_column(&mut df, schema::COL_STARTED, dayfirst_to_datetime)?;
    coerce_column(&mut df, schema::COL_ENDED, dayfirst_to_datetime)?;
    coerce_column(&mut df, schema::COL_POWER_W, decimal_comma_to_f64)?;
    coerce_column(&mut df, schema::COL_HOUR, to_hour_of_day)?;
    coerce_column(&mut df, schema::COL_OCCUPANCY_PCT, decimal_comma_to_f64)?;
    coerce_column(&mut df, schema::COL_ENERGY_WH, decimal_comma_to_f64)?;

    drop_inverted_sessions(df)
}

/// Drop rows whose end timestamp precedes their start timestamp.
///
/// Only rows where both timestamps parsed can violate the invariant; rows
/// with a missing timestamp stay in and are excluded later, by whichever
/// view needs the field.
fn drop_inverted_sessions(df: DataFrame) -> Result<DataFrame> {
    let started = df
        .column(schema::COL_STARTED)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let ended = df
        .column(schema::COL_ENDED)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;

    let both_present = started.is_not_null() & ended.is_not_null();
    let inverted = started.gt(&ended)?;
    let keep = !(both_present & inverted);

    let before = df.height();
    let df = df.filter(&keep)?;
    let dropped = before - df.height();
    if dropped > 0 {
        warn!("Dropped {} sessions with end before start", dropped);
    }

    Ok(df)
}

/// Load the vehicle registration table and apply its schema.
pub fn load_vehicles(path: &Path, delimiter: u8) -> Result<DataFrame> {
    let mut df = load_table(path, delimiter)?;

    coerce_column(&mut df, schema::COL_CATALOG_PRICE, decimal_comma_to_f64)?;
    coerce_column(&mut df, schema::COL_TOP_SPEED, decimal_comma_to_f64)?;
    coerce_column(&mut df, schema::COL_MASS, decimal_comma_to_f64)?;
    coerce_column(&mut df, schema::COL_FIRST_REGISTRATION, dayfirst_to_datetime)?;

    Ok(df)
}

/// Load the province table (name + WKT geometry column).
///
/// Geometry stays a string column here; [`crate::geo`] parses it when the
/// map view is built, skipping malformed rows.
pub fn load_provinces(path: &Path, delimiter: u8) -> Result<DataFrame> {
    let df = load_table(path, delimiter)?;
    for required in [schema::COL_PROVINCE, schema::COL_GEOMETRY_WKT] {
        if df.column(required).is_err() {
            return Err(DashboardError::ColumnNotFound(required.to_string()));
        }
    }
    Ok(df)
}

/// Load the charging-station point table.
pub fn load_stations(path: &Path, delimiter: u8) -> Result<DataFrame> {
    let mut df = load_table(path, delimiter)?;

    coerce_column(&mut df, schema::COL_LAT, decimal_comma_to_f64)?;
    coerce_column(&mut df, schema::COL_LON, decimal_comma_to_f64)?;
    coerce_column(&mut df, schema::COL_STATION_POWER_KW, decimal_comma_to_f64)?;

    debug!("Station table ready ({} points)", df.height());
    Ok(df)
}
