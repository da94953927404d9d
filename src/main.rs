//! CLI entry point for the dashboard data pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use laadview::loader::coerce::parse_dayfirst_datetime;
use laadview::{
    AggFn, DashboardConfig, DatasetCache, PivotSpec, PlotKind, RangeConstraint, RenderArtifact,
    SelectControl, ViewKind, ViewOutcome, ViewRequest, run_view, schema,
};
use tracing::info;

/// CLI-compatible view selector.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliView {
    /// Charging sessions
    Sessions,
    /// Vehicle registrations
    Vehicles,
    /// Choropleth map with station markers
    Map,
}

impl From<CliView> for ViewKind {
    fn from(cli: CliView) -> Self {
        match cli {
            CliView::Sessions => ViewKind::Sessions,
            CliView::Vehicles => ViewKind::Vehicles,
            CliView::Map => ViewKind::Map,
        }
    }
}

/// CLI-compatible plot selector.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPlot {
    /// Pivot heatmap (default)
    Heatmap,
    /// Scatter plot; requires --x and --y
    Scatter,
    /// Box plot; requires --group and --value
    Box,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "EV-charging dashboard data pipeline",
    long_about = "Loads the charging-session, vehicle and geo exports, applies range\n\
                  filters, and emits a plot description.\n\n\
                  RANGES use inclusive 'lo..hi' syntax:\n  \
                  laadview --power 50..70 --hour 0..23\n  \
                  laadview --started \"05-01-2024 14:00..10-02-2024\"\n\n\
                  EXAMPLES:\n  \
                  # Session heatmap (bucket x maandjaar), counted\n  \
                  laadview --sessions data/laadsessies.csv\n\n  \
                  # Energy sum instead of counts\n  \
                  laadview --sum verbruik_wh\n\n  \
                  # Vehicle scatter, one brand only\n  \
                  laadview --view vehicles --vehicles voertuigen.csv \\\n      \
                  --plot scatter --x massa_ledig --y catalogusprijs --brand Tesla\n\n  \
                  # Map view\n  \
                  laadview --view map --provinces provincies.csv --stations laadpalen.csv"
)]
struct Args {
    /// Which view to compute
    #[arg(long, value_enum, default_value = "sessions")]
    view: CliView,

    /// Path to the charging-session CSV
    #[arg(short, long, default_value = "data/laadsessies.csv")]
    sessions: String,

    /// Path to the vehicle registration CSV
    #[arg(long)]
    vehicles: Option<String>,

    /// Path to the province polygon CSV (WKT geometry column)
    #[arg(long)]
    provinces: Option<String>,

    /// Path to the charging-station point CSV
    #[arg(long)]
    stations: Option<String>,

    /// Field delimiter of the exports
    #[arg(long, default_value = ";")]
    delimiter: char,

    /// Remote URL for the vehicle CSV, fetched once when the local copy
    /// does not exist yet
    #[arg(long)]
    fetch_vehicles: Option<String>,

    /// Requested power range in watts (lo..hi)
    #[arg(long)]
    power: Option<String>,

    /// Hour-of-day range (lo..hi, both 0-23)
    #[arg(long)]
    hour: Option<String>,

    /// Occupancy percentage range (lo..hi)
    #[arg(long)]
    occupancy: Option<String>,

    /// Consumed energy range in watt-hours (lo..hi)
    #[arg(long)]
    energy: Option<String>,

    /// Session start window, day-first dates (lo..hi)
    #[arg(long)]
    started: Option<String>,

    /// Catalog price range in euros (lo..hi, vehicle view)
    #[arg(long)]
    price: Option<String>,

    /// Keep only these brands (vehicle view; repeatable)
    #[arg(long)]
    brand: Vec<String>,

    /// Plot type for the tabular views
    #[arg(long, value_enum, default_value = "heatmap")]
    plot: CliPlot,

    /// X column for --plot scatter
    #[arg(long)]
    x: Option<String>,

    /// Y column for --plot scatter
    #[arg(long)]
    y: Option<String>,

    /// Group column for --plot box
    #[arg(long)]
    group: Option<String>,

    /// Value column for --plot box
    #[arg(long)]
    value: Option<String>,

    /// Pivot row key for --plot heatmap
    #[arg(long, default_value = schema::COL_BUCKET)]
    row: String,

    /// Pivot column key for --plot heatmap
    #[arg(long, default_value = schema::COL_MAANDJAAR)]
    col: String,

    /// Sum this column in the heatmap instead of counting rows
    #[arg(long)]
    sum: Option<String>,

    /// Marker-cluster cell size in degrees (map view)
    #[arg(long, default_value = "0.1")]
    cluster_cell: f64,

    /// Output the artifact as JSON to stdout instead of a summary
    ///
    /// Disables all progress logs; only outputs the final JSON.
    #[arg(long)]
    json: bool,

    /// Write the artifact JSON to this path
    #[arg(short = 'o', long)]
    emit_artifact: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parse an inclusive "lo..hi" numeric range.
fn parse_numeric_range(raw: &str, flag: &str) -> Result<(f64, f64)> {
    let (lo, hi) = raw
        .split_once("..")
        .ok_or_else(|| anyhow!("--{} expects 'lo..hi', got '{}'", flag, raw))?;
    let lo: f64 = lo
        .trim()
        .parse()
        .map_err(|_| anyhow!("--{}: '{}' is not a number", flag, lo))?;
    let hi: f64 = hi
        .trim()
        .parse()
        .map_err(|_| anyhow!("--{}: '{}' is not a number", flag, hi))?;
    Ok((lo, hi))
}

/// Parse an inclusive "lo..hi" day-first date range.
fn parse_date_range(raw: &str, flag: &str) -> Result<RangeConstraint> {
    let (lo, hi) = raw
        .split_once("..")
        .ok_or_else(|| anyhow!("--{} expects 'lo..hi', got '{}'", flag, raw))?;
    let lo = parse_dayfirst_datetime(lo)
        .ok_or_else(|| anyhow!("--{}: '{}' is not a day-first date", flag, lo))?;
    let hi = parse_dayfirst_datetime(hi)
        .ok_or_else(|| anyhow!("--{}: '{}' is not a day-first date", flag, hi))?;
    Ok(RangeConstraint::date(schema::COL_STARTED, lo, hi))
}

/// Collect the range constraints the flags express.
fn build_constraints(args: &Args) -> Result<Vec<RangeConstraint>> {
    let mut constraints = Vec::new();

    let numeric_flags = [
        (&args.power, schema::COL_POWER_W, "power"),
        (&args.occupancy, schema::COL_OCCUPANCY_PCT, "occupancy"),
        (&args.energy, schema::COL_ENERGY_WH, "energy"),
        (&args.price, schema::COL_CATALOG_PRICE, "price"),
    ];
    for (raw, column, flag) in numeric_flags {
        if let Some(raw) = raw {
            let (lo, hi) = parse_numeric_range(raw, flag)?;
            constraints.push(RangeConstraint::numeric(column, lo, hi));
        }
    }

    if let Some(raw) = &args.hour {
        let (lo, hi) = parse_numeric_range(raw, "hour")?;
        constraints.push(RangeConstraint::hour(schema::COL_HOUR, lo as i64, hi as i64));
    }

    if let Some(raw) = &args.started {
        constraints.push(parse_date_range(raw, "started")?);
    }

    Ok(constraints)
}

fn build_plot(args: &Args) -> Result<PlotKind> {
    match args.plot {
        CliPlot::Heatmap => {
            let spec = match &args.sum {
                Some(value) => PivotSpec::sum(&args.row, &args.col, value),
                None => PivotSpec::count(&args.row, &args.col),
            };
            Ok(PlotKind::Heatmap(spec))
        }
        CliPlot::Scatter => {
            let x = args
                .x
                .clone()
                .ok_or_else(|| anyhow!("--plot scatter requires --x"))?;
            let y = args
                .y
                .clone()
                .ok_or_else(|| anyhow!("--plot scatter requires --y"))?;
            Ok(PlotKind::Scatter { x, y })
        }
        CliPlot::Box => {
            let group = args
                .group
                .clone()
                .ok_or_else(|| anyhow!("--plot box requires --group"))?;
            let value = args
                .value
                .clone()
                .ok_or_else(|| anyhow!("--plot box requires --value"))?;
            Ok(PlotKind::BoxPlot { group, value })
        }
    }
}

fn build_config(args: &Args) -> Result<DashboardConfig> {
    let mut builder = DashboardConfig::builder()
        .sessions_path(&args.sessions)
        .delimiter(args.delimiter as u8)
        .cluster_cell_deg(args.cluster_cell);

    if let Some(path) = &args.vehicles {
        builder = builder.vehicles_path(path);
    }
    if let Some(path) = &args.provinces {
        builder = builder.provinces_path(path);
    }
    if let Some(path) = &args.stations {
        builder = builder.stations_path(path);
    }
    if let Some(url) = &args.fetch_vehicles {
        builder = builder.vehicle_source_url(url);
    }

    Ok(builder.build()?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    let mut request =
        ViewRequest::new(args.view.into(), build_plot(&args)?).with_constraints(build_constraints(&args)?);

    if !args.brand.is_empty() {
        request = request.with_selections(vec![SelectControl {
            field: schema::COL_BRAND.to_string(),
            options: args.brand.clone(),
            selected: args.brand.clone(),
        }]);
    }

    info!("Computing {:?} view", request.kind);
    let outcome = run_view(DatasetCache::global(), &config, &request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.artifact)?);
        return Ok(());
    }

    if let Some(path) = &args.emit_artifact {
        std::fs::write(path, serde_json::to_string_pretty(&outcome.artifact)?)?;
        info!("Artifact written to: {}", path);
    }

    print_summary(&outcome);
    Ok(())
}

/// Print a human-readable summary of the view outcome.
///
/// Note: this uses `println!` intentionally for user-facing CLI output;
/// unlike logging it should always be visible.
fn print_summary(outcome: &ViewOutcome) {
    println!();
    println!("{}", "=".repeat(80));
    println!("VIEW COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "Rows: {} loaded, {} after filtering",
        outcome.rows_loaded, outcome.rows_matched
    );
    println!();

    match &outcome.artifact {
        RenderArtifact::Heatmap { title, table } => {
            println!("Heatmap: {}", title);
            println!("{}", "-".repeat(40));

            print!("{:<14}", "");
            for col in &table.column_labels {
                print!("{:>9}", truncate_str(col, 8));
            }
            println!();

            for (r, row) in table.row_labels.iter().enumerate() {
                print!("{:<14}", truncate_str(row, 13));
                for cell in &table.cells[r] {
                    match cell {
                        Some(v) if matches!(table.agg, AggFn::Count) => print!("{:>9}", *v as u64),
                        Some(v) => print!("{:>9.1}", v),
                        None => print!("{:>9}", "-"),
                    }
                }
                println!();
            }
            println!();
            println!("Total: {:.1}", table.total());
        }
        RenderArtifact::Scatter { title, points, x_label, y_label } => {
            println!("Scatter: {} ({} vs {})", title, x_label, y_label);
            println!("  {} points", points.len());
        }
        RenderArtifact::BoxPlot { title, groups, value_label } => {
            println!("Box plot: {} ({})", title, value_label);
            println!("{}", "-".repeat(40));
            for g in groups {
                println!(
                    "  {:<14} n={:<5} min={:.1} q1={:.1} median={:.1} q3={:.1} max={:.1}",
                    truncate_str(&g.group, 13),
                    g.count,
                    g.min,
                    g.q1,
                    g.median,
                    g.q3,
                    g.max
                );
            }
        }
        RenderArtifact::Map { title, regions, clusters } => {
            println!("Map: {}", title);
            println!("  {} choropleth regions, {} marker clusters", regions.len(), clusters.len());
        }
        RenderArtifact::Empty { message } => {
            println!("{}", message);
        }
    }

    println!();
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

/// Truncate a string to max length with ellipsis.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
