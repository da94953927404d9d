//! View dispatch.
//!
//! A single parameterized pipeline serves every page: a [`ViewRequest`]
//! names the view variant and carries the control state, and [`run_view`]
//! dispatches to the shared loader/filter/aggregate primitives. Every
//! invocation is a one-shot, stateless recomputation; only the
//! full-dataset load is memoized.

use crate::aggregate::{PivotSpec, pivot};
use crate::config::DashboardConfig;
use crate::controls::SelectControl;
use crate::error::{DashboardError, Result};
use crate::filter::{RangeConstraint, apply_constraints};
use crate::loader::{self, DatasetCache};
use crate::render::{self, RenderArtifact};
use crate::{geo, schema};
use polars::prelude::DataFrame;
use tracing::info;

/// Which plot a tabular view should produce.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotKind {
    /// Pivot heatmap.
    Heatmap(PivotSpec),
    /// Scatter/relationship plot of two numeric columns.
    Scatter { x: String, y: String },
    /// Box plot of a numeric column per category.
    BoxPlot { group: String, value: String },
}

impl PlotKind {
    /// The default session heatmap: session count per bucket and maandjaar.
    pub fn session_heatmap() -> Self {
        PlotKind::Heatmap(PivotSpec::count(schema::COL_BUCKET, schema::COL_MAANDJAAR))
    }
}

/// The view variants of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Charging sessions: heatmap/scatter/box over the session table.
    Sessions,
    /// Vehicle registrations: plots over the vehicle table.
    Vehicles,
    /// Choropleth plus clustered station markers.
    Map,
}

/// Immutable per-invocation state: the view plus all control values.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub kind: ViewKind,
    /// Range-slider state, conjunctively applied.
    pub constraints: Vec<RangeConstraint>,
    /// Category-picker state, applied after the range filters.
    pub selections: Vec<SelectControl>,
    /// Plot choice for the tabular views; the map view ignores it.
    pub plot: PlotKind,
}

impl ViewRequest {
    pub fn new(kind: ViewKind, plot: PlotKind) -> Self {
        Self {
            kind,
            constraints: Vec::new(),
            selections: Vec::new(),
            plot,
        }
    }

    pub fn with_constraints(mut self, constraints: Vec<RangeConstraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_selections(mut self, selections: Vec<SelectControl>) -> Self {
        self.selections = selections;
        self
    }
}

/// The result of one view invocation.
#[derive(Debug, Clone)]
pub struct ViewOutcome {
    pub artifact: RenderArtifact,
    /// Rows in the full source table.
    pub rows_loaded: usize,
    /// Rows surviving all filters.
    pub rows_matched: usize,
}

/// Run one view: load (memoized), filter, aggregate, describe the plot.
pub fn run_view(
    cache: &DatasetCache,
    config: &DashboardConfig,
    request: &ViewRequest,
) -> Result<ViewOutcome> {
    match request.kind {
        ViewKind::Sessions => {
            let df = cache.get_or_load(&config.sessions_path, |p| {
                loader::load_sessions(p, config.delimiter)
            })?;
            tabular_view(&df, request, "Laadsessies")
        }
        ViewKind::Vehicles => {
            let path = config
                .vehicles_path
                .as_deref()
                .ok_or_else(|| DashboardError::InvalidConfig("no vehicle table configured".into()))?;
            if let Some(url) = &config.vehicle_source_url {
                loader::ensure_local_copy(url, path)?;
            }
            let df = cache.get_or_load(path, |p| loader::load_vehicles(p, config.delimiter))?;
            tabular_view(&df, request, "Voertuigen")
        }
        ViewKind::Map => map_view(cache, config, request),
    }
}

/// Shared path for the session and vehicle views.
fn tabular_view(df: &DataFrame, request: &ViewRequest, title: &str) -> Result<ViewOutcome> {
    let rows_loaded = df.height();
    let filtered = filter_all(df, request)?;
    let rows_matched = filtered.height();
    info!("{}: {} of {} rows match", title, rows_matched, rows_loaded);

    let artifact = match &request.plot {
        PlotKind::Heatmap(spec) => {
            let table = pivot(&filtered, spec)?;
            render::heatmap(title, &table)
        }
        PlotKind::Scatter { x, y } => render::scatter(title, &filtered, x, y)?,
        PlotKind::BoxPlot { group, value } => render::box_plot(title, &filtered, group, value)?,
    };

    Ok(ViewOutcome {
        artifact,
        rows_loaded,
        rows_matched,
    })
}

/// The map view: choropleth from province averages, clusters from points.
fn map_view(
    cache: &DatasetCache,
    config: &DashboardConfig,
    request: &ViewRequest,
) -> Result<ViewOutcome> {
    let provinces_path = config
        .provinces_path
        .as_deref()
        .ok_or_else(|| DashboardError::InvalidConfig("no province table configured".into()))?;
    let stations_path = config
        .stations_path
        .as_deref()
        .ok_or_else(|| DashboardError::InvalidConfig("no station table configured".into()))?;

    let provinces_df = cache.get_or_load(provinces_path, |p| {
        loader::load_provinces(p, config.delimiter)
    })?;
    let stations_df = cache.get_or_load(stations_path, |p| {
        loader::load_stations(p, config.delimiter)
    })?;

    let rows_loaded = stations_df.height();
    let filtered = filter_all(&stations_df, request)?;
    let rows_matched = filtered.height();
    info!("Kaart: {} of {} stations match", rows_matched, rows_loaded);

    let provinces = geo::provinces_from_frame(&provinces_df)?;
    let averages = geo::average_power_by_province(&filtered)?;
    let regions = geo::choropleth_regions(&provinces, &averages);

    let stations = geo::stations_from_frame(&filtered)?;
    let clusters = geo::cluster_markers(&stations, config.cluster_cell_deg);

    Ok(ViewOutcome {
        artifact: render::map("Laadpalen", regions, clusters),
        rows_loaded,
        rows_matched,
    })
}

fn filter_all(df: &DataFrame, request: &ViewRequest) -> Result<DataFrame> {
    let mut filtered = apply_constraints(df, &request.constraints)?;
    for selection in &request.selections {
        filtered = selection.apply(&filtered)?;
    }
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RangeConstraint;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_fixture(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("laadview-view-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const SESSIONS_CSV: &str = "\
gestart;beeindigd;vermogen_w;uur;bezetting_pct;verbruik_wh;blok;maandjaar
05-01-2024 14:00;05-01-2024 15:30;40;14;80,5;1250,5;middag;jan-24
10-02-2024 09:00;10-02-2024 09:45;60;9;61,0;800,0;ochtend;feb-24
12-03-2024 21:00;12-03-2024 23:00;55;21;95,5;2100,0;avond;mrt-24
";

    fn sessions_config(name: &str) -> DashboardConfig {
        let path = write_fixture(name, SESSIONS_CSV);
        DashboardConfig::builder()
            .sessions_path(path)
            .build()
            .unwrap()
    }

    #[test]
    fn test_session_view_default_heatmap() {
        let cache = DatasetCache::new();
        let config = sessions_config("sessions_heatmap.csv");
        let request = ViewRequest::new(ViewKind::Sessions, PlotKind::session_heatmap());

        let outcome = run_view(&cache, &config, &request).unwrap();
        assert_eq!(outcome.rows_loaded, 3);
        assert_eq!(outcome.rows_matched, 3);

        let RenderArtifact::Heatmap { table, .. } = outcome.artifact else {
            panic!("expected heatmap");
        };
        assert_eq!(table.get("middag", "jan-24"), Some(1.0));
        assert_eq!(table.get("middag", "feb-24"), Some(0.0));
    }

    #[test]
    fn test_session_view_filters_are_applied() {
        let cache = DatasetCache::new();
        let config = sessions_config("sessions_filtered.csv");
        let request = ViewRequest::new(ViewKind::Sessions, PlotKind::session_heatmap())
            .with_constraints(vec![
                RangeConstraint::numeric(schema::COL_POWER_W, 50.0, 70.0),
                RangeConstraint::hour(schema::COL_HOUR, 0, 23),
            ]);

        let outcome = run_view(&cache, &config, &request).unwrap();
        assert_eq!(outcome.rows_matched, 2);
    }

    #[test]
    fn test_session_view_empty_filter_yields_placeholder() {
        let cache = DatasetCache::new();
        let config = sessions_config("sessions_empty.csv");
        let request = ViewRequest::new(ViewKind::Sessions, PlotKind::session_heatmap())
            .with_constraints(vec![RangeConstraint::numeric(
                schema::COL_POWER_W,
                5000.0,
                9000.0,
            )]);

        let outcome = run_view(&cache, &config, &request).unwrap();
        assert_eq!(outcome.rows_matched, 0);
        assert!(outcome.artifact.is_empty());
    }

    #[test]
    fn test_vehicle_view_requires_configured_path() {
        let cache = DatasetCache::new();
        let config = sessions_config("sessions_novehicles.csv");
        let request = ViewRequest::new(
            ViewKind::Vehicles,
            PlotKind::Scatter {
                x: schema::COL_MASS.to_string(),
                y: schema::COL_CATALOG_PRICE.to_string(),
            },
        );

        let err = run_view(&cache, &config, &request).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig(_)));
    }

    #[test]
    fn test_rerun_with_same_request_is_deterministic() {
        let cache = DatasetCache::new();
        let config = sessions_config("sessions_rerun.csv");
        let request = ViewRequest::new(ViewKind::Sessions, PlotKind::session_heatmap())
            .with_constraints(vec![RangeConstraint::hour(schema::COL_HOUR, 9, 21)]);

        let first = run_view(&cache, &config, &request).unwrap();
        let second = run_view(&cache, &config, &request).unwrap();
        assert_eq!(first.artifact, second.artifact);
        assert_eq!(first.rows_matched, second.rows_matched);
    }
}
