//! EV-Charging Dashboard Data Pipeline
//!
//! The data layer behind an interactive charging-session dashboard, built
//! with Rust and Polars. Each view is one pure pass over immutable source
//! snapshots:
//!
//! - **Loader**: delimited CSV ingestion with decimal-comma and day-first
//!   date coercion; unparseable values become missing, never errors
//! - **Range-Filter**: inclusive (column, lower, upper) constraints applied
//!   conjunctively, as a pure function of table + bounds
//! - **Aggregator**: 2-D count/sum pivots with the fixed maandjaar column
//!   ordering
//! - **Renderer boundary**: serializable plot descriptions (heatmap,
//!   scatter, box plot, choropleth map with marker clusters) that degrade
//!   to a "no data" placeholder on empty input
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use laadview::{
//!     DashboardConfig, DatasetCache, PlotKind, ViewKind, ViewRequest,
//!     RangeConstraint, run_view, schema,
//! };
//!
//! let config = DashboardConfig::builder()
//!     .sessions_path("data/laadsessies.csv")
//!     .build()?;
//!
//! let request = ViewRequest::new(ViewKind::Sessions, PlotKind::session_heatmap())
//!     .with_constraints(vec![
//!         RangeConstraint::numeric(schema::COL_POWER_W, 50.0, 70.0),
//!         RangeConstraint::hour(schema::COL_HOUR, 0, 23),
//!     ]);
//!
//! let outcome = run_view(DatasetCache::global(), &config, &request)?;
//! println!("{}", serde_json::to_string_pretty(&outcome.artifact)?);
//! ```
//!
//! There is no state machine: every control change recomputes the affected
//! view from scratch, and only the full-dataset load is memoized (keyed by
//! source path, for the lifetime of the process).

pub mod aggregate;
pub mod config;
pub mod controls;
pub mod error;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod render;
pub mod schema;
pub mod view;

// Re-exports for convenient access
pub use crate::aggregate::{AggFn, MONTHS, PivotSpec, PivotTable, expand_month_order, pivot};
pub use crate::config::{ConfigValidationError, DashboardConfig, DashboardConfigBuilder};
pub use crate::controls::{RangeControl, SelectControl};
pub use crate::error::{DashboardError, Result as DashboardResult, ResultExt};
pub use crate::filter::{
    Bound, Extent, ExtentKind, RangeConstraint, apply_constraints, field_extent,
};
pub use crate::geo::{ChoroplethRegion, MarkerCluster, Province, StationPoint};
pub use crate::loader::{DatasetCache, ensure_local_copy};
pub use crate::render::{BoxSummary, NO_DATA_MESSAGE, RenderArtifact};
pub use crate::view::{PlotKind, ViewKind, ViewOutcome, ViewRequest, run_view};
