//! Interactive control state, modeled as explicit immutable configuration.
//!
//! The dashboard's sliders and pickers are not ambient mutable state: each
//! control is a value derived from the loaded dataset's observed extrema,
//! carried into the pipeline per invocation. Re-running a view with the
//! same controls always produces the same result.

use crate::error::{DashboardError, Result};
use crate::filter::{Extent, ExtentKind, RangeConstraint, field_extent};
use polars::prelude::*;

/// A two-handle range selector over one field.
///
/// `full` is the dataset's observed [min, max]; `selected` is the current
/// handle position, defaulting to the full range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeControl {
    pub field: String,
    pub full: Extent,
    pub selected: Extent,
}

impl RangeControl {
    /// Derive a control from the observed extrema of `column`.
    pub fn from_frame(df: &DataFrame, column: &str, kind: ExtentKind) -> Result<Self> {
        let full = field_extent(df, column, kind)?;
        Ok(Self {
            field: column.to_string(),
            full,
            selected: full,
        })
    }

    /// Move the handles. The selection replaces the previous one wholesale;
    /// there is no incremental widget state to get out of sync.
    pub fn with_selection(mut self, selected: Extent) -> Self {
        self.selected = selected;
        self
    }

    /// The constraint this control currently expresses.
    pub fn to_constraint(&self) -> RangeConstraint {
        RangeConstraint {
            column: self.field.clone(),
            bound: self.selected.full_bound(),
        }
    }
}

/// A multi-select category picker over one string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectControl {
    pub field: String,
    pub options: Vec<String>,
    pub selected: Vec<String>,
}

impl SelectControl {
    /// Derive the option list from the unique values of `column`, sorted.
    /// All options start selected.
    pub fn from_frame(df: &DataFrame, column: &str) -> Result<Self> {
        let series = df
            .column(column)
            .map_err(|_| DashboardError::ColumnNotFound(column.to_string()))?
            .as_materialized_series();

        let unique = series.unique()?.cast(&DataType::String)?;
        let mut options: Vec<String> = unique
            .str()?
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .collect();
        options.sort();

        Ok(Self {
            field: column.to_string(),
            selected: options.clone(),
            options,
        })
    }

    pub fn with_selection(mut self, selected: Vec<String>) -> Self {
        self.selected = selected;
        self
    }

    /// Keep only rows whose value is one of the selected options.
    /// Null values never match.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let series = df
            .column(&self.field)
            .map_err(|_| DashboardError::ColumnNotFound(self.field.clone()))?
            .as_materialized_series()
            .cast(&DataType::String)?;

        let mask: BooleanChunked = series
            .str()?
            .into_iter()
            .map(|opt| Some(opt.is_some_and(|v| self.selected.iter().any(|s| s == v))))
            .collect();

        Ok(df.filter(&mask)?)
    }
}
