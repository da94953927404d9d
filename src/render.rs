//! Renderer boundary.
//!
//! The pipeline ends at a [`RenderArtifact`]: a serializable description of
//! what the plotting layer should draw. Builders never mutate their inputs
//! and degrade to [`RenderArtifact::Empty`] when handed zero rows, so an
//! empty filter result shows a "no data" indicator instead of a broken
//! plot.

use crate::aggregate::PivotTable;
use crate::error::{DashboardError, Result};
use crate::geo::{ChoroplethRegion, MarkerCluster};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Message shown in place of a plot when a filter matches nothing.
pub const NO_DATA_MESSAGE: &str = "Geen data voor de gekozen filters";

/// Five-number summary of one box-plot group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub group: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

/// A description of a visual artifact, consumed by the plotting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderArtifact {
    /// Pivot-table heatmap.
    Heatmap { title: String, table: PivotTable },
    /// Scatter/relationship plot of (x, y) pairs.
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
    /// Box plot, one summary per category group.
    BoxPlot {
        title: String,
        value_label: String,
        groups: Vec<BoxSummary>,
    },
    /// Choropleth layer plus clustered point markers.
    Map {
        title: String,
        regions: Vec<ChoroplethRegion>,
        clusters: Vec<MarkerCluster>,
    },
    /// Placeholder for an empty input.
    Empty { message: String },
}

impl RenderArtifact {
    fn empty() -> Self {
        RenderArtifact::Empty {
            message: NO_DATA_MESSAGE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RenderArtifact::Empty { .. })
    }
}

/// Heatmap from a pivot table.
pub fn heatmap(title: impl Into<String>, table: &PivotTable) -> RenderArtifact {
    if table.is_empty() {
        return RenderArtifact::empty();
    }
    RenderArtifact::Heatmap {
        title: title.into(),
        table: table.clone(),
    }
}

/// Scatter plot of two numeric columns; rows missing either value are
/// excluded pairwise.
pub fn scatter(
    title: impl Into<String>,
    df: &DataFrame,
    x_col: &str,
    y_col: &str,
) -> Result<RenderArtifact> {
    let x = numeric_values(df, x_col)?;
    let y = numeric_values(df, y_col)?;

    let points: Vec<(f64, f64)> = x
        .into_iter()
        .zip(y)
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect();

    if points.is_empty() {
        return Ok(RenderArtifact::empty());
    }
    Ok(RenderArtifact::Scatter {
        title: title.into(),
        x_label: x_col.to_string(),
        y_label: y_col.to_string(),
        points,
    })
}

/// Box plot of a numeric column split by a category column.
pub fn box_plot(
    title: impl Into<String>,
    df: &DataFrame,
    group_col: &str,
    value_col: &str,
) -> Result<RenderArtifact> {
    let groups = group_labels(df, group_col)?;
    let values = numeric_values(df, value_col)?;

    let mut by_group: std::collections::HashMap<String, Vec<f64>> =
        std::collections::HashMap::new();
    for (group, value) in groups.into_iter().zip(values) {
        if let (Some(group), Some(value)) = (group, value) {
            by_group.entry(group).or_default().push(value);
        }
    }

    let mut summaries: Vec<BoxSummary> = by_group
        .into_iter()
        .map(|(group, mut values)| {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            five_number_summary(group, &values)
        })
        .collect();
    summaries.sort_by(|a, b| a.group.cmp(&b.group));

    if summaries.is_empty() {
        return Ok(RenderArtifact::empty());
    }
    Ok(RenderArtifact::BoxPlot {
        title: title.into(),
        value_label: value_col.to_string(),
        groups: summaries,
    })
}

/// Map artifact from prepared geo layers.
pub fn map(
    title: impl Into<String>,
    regions: Vec<ChoroplethRegion>,
    clusters: Vec<MarkerCluster>,
) -> RenderArtifact {
    if regions.is_empty() && clusters.is_empty() {
        return RenderArtifact::empty();
    }
    RenderArtifact::Map {
        title: title.into(),
        regions,
        clusters,
    }
}

/// Quantile of a sorted slice, by linear interpolation.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

fn five_number_summary(group: String, sorted: &[f64]) -> BoxSummary {
    BoxSummary {
        group,
        min: sorted[0],
        q1: quantile_sorted(sorted, 0.25),
        median: quantile_sorted(sorted, 0.5),
        q3: quantile_sorted(sorted, 0.75),
        max: sorted[sorted.len() - 1],
        count: sorted.len(),
    }
}

fn numeric_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(column)
        .map_err(|_| DashboardError::ColumnNotFound(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn group_labels(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
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
