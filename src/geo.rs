//! Geodata for the map view.
//!
//! Two independent layers: a choropleth of province polygons shaded by an
//! aggregate value, joined by province name, and clustered point markers
//! for the individual charging stations. The layers are never joined to
//! each other.

use crate::error::{DashboardError, Result};
use crate::schema;
use geo::{Centroid, Geometry, MultiPolygon};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use wkt::TryFromWkt;

/// A province polygon, parsed from the WKT geometry column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Province {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// One shaded choropleth region: polygon, joined value, label anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethRegion {
    pub name: String,
    pub value: f64,
    pub geometry: MultiPolygon<f64>,
    /// Centroid (lon, lat) to anchor the region label, when computable.
    pub label_anchor: Option<(f64, f64)>,
}

/// A charging-station point record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPoint {
    pub lat: f64,
    pub lon: f64,
    pub power_kw: f64,
    pub connector: String,
}

/// A group of nearby markers, rendered as one symbol at low zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerCluster {
    pub lat: f64,
    pub lon: f64,
    pub count: usize,
}

/// Parse the province frame into polygons.
///
/// Rows with malformed WKT are skipped rather than failing the view; a
/// POLYGON is promoted to a single-member MULTIPOLYGON.
pub fn provinces_from_frame(df: &DataFrame) -> Result<Vec<Province>> {
    let names = string_column(df, schema::COL_PROVINCE)?;
    let geometries = string_column(df, schema::COL_GEOMETRY_WKT)?;

    let mut provinces = Vec::new();
    for (name, raw) in names.iter().zip(geometries.iter()) {
        let (Some(name), Some(raw)) = (name, raw) else {
            continue;
        };
        match Geometry::<f64>::try_from_wkt_str(raw) {
            Ok(Geometry::MultiPolygon(mp)) => provinces.push(Province {
                name: name.clone(),
                geometry: mp,
            }),
            Ok(Geometry::Polygon(p)) => provinces.push(Province {
                name: name.clone(),
                geometry: MultiPolygon(vec![p]),
            }),
            Ok(_) => debug!("Skipping non-polygon geometry for '{}'", name),
            Err(err) => debug!("Skipping malformed geometry for '{}': {:?}", name, err),
        }
    }

    Ok(provinces)
}

/// Parse the station frame into point records.
///
/// Rows missing a coordinate are dropped; a missing power rating becomes
/// zero-rated only in the sense of being skipped, never plotted as 0 kW.
pub fn stations_from_frame(df: &DataFrame) -> Result<Vec<StationPoint>> {
    let lat = float_column(df, schema::COL_LAT)?;
    let lon = float_column(df, schema::COL_LON)?;
    let power = float_column(df, schema::COL_STATION_POWER_KW)?;
    let connector = string_column(df, schema::COL_CONNECTOR)?;

    let mut stations = Vec::new();
    for i in 0..df.height() {
        let (Some(lat), Some(lon), Some(power_kw)) = (lat[i], lon[i], power[i]) else {
            continue;
        };
        stations.push(StationPoint {
            lat,
            lon,
            power_kw,
            connector: connector[i].clone().unwrap_or_else(|| "onbekend".to_string()),
        });
    }

    Ok(stations)
}

/// Join (province -> value) aggregates against the polygons by name.
///
/// Names present on only one side are silently excluded from the layer;
/// a join mismatch is never fatal.
pub fn choropleth_regions(
    provinces: &[Province],
    values: &HashMap<String, f64>,
) -> Vec<ChoroplethRegion> {
    let mut regions = Vec::new();
    for province in provinces {
        let Some(&value) = values.get(&province.name) else {
            debug!("No aggregate value for province '{}'", province.name);
            continue;
        };
        let label_anchor = province.geometry.centroid().map(|c| (c.x(), c.y()));
        regions.push(ChoroplethRegion {
            name: province.name.clone(),
            value,
            geometry: province.geometry.clone(),
            label_anchor,
        });
    }

    let matched = regions.len();
    if matched < values.len() {
        debug!(
            "{} aggregate rows had no matching polygon",
            values.len() - matched
        );
    }
    regions
}

/// Average station power per province, the choropleth's aggregate.
///
/// The station frame carries a province column; rows with a null province
/// or power rating are excluded.
pub fn average_power_by_province(df: &DataFrame) -> Result<HashMap<String, f64>> {
    let provinces = string_column(df, schema::COL_PROVINCE)?;
    let power = float_column(df, schema::COL_STATION_POWER_KW)?;

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for i in 0..df.height() {
        let (Some(province), Some(kw)) = (&provinces[i], power[i]) else {
            continue;
        };
        let entry = sums.entry(province.clone()).or_insert((0.0, 0));
        entry.0 += kw;
        entry.1 += 1;
    }

    Ok(sums
        .into_iter()
        .map(|(name, (sum, n))| (name, sum / n as f64))
        .collect())
}

/// Grid-based marker clustering.
///
/// Stations are bucketed into square cells of `cell_deg` degrees; each
/// non-empty cell becomes one cluster at the mean position of its members.
/// Output is sorted by (lat, lon) so the layer is stable across runs.
pub fn cluster_markers(stations: &[StationPoint], cell_deg: f64) -> Vec<MarkerCluster> {
    if cell_deg <= 0.0 {
        return Vec::new();
    }

    let mut cells: HashMap<(i64, i64), (f64, f64, usize)> = HashMap::new();
    for station in stations {
        let key = (
            (station.lat / cell_deg).floor() as i64,
            (station.lon / cell_deg).floor() as i64,
        );
        let entry = cells.entry(key).or_insert((0.0, 0.0, 0));
        entry.0 += station.lat;
        entry.1 += station.lon;
        entry.2 += 1;
    }

    let mut clusters: Vec<MarkerCluster> = cells
        .into_values()
        .map(|(lat_sum, lon_sum, count)| MarkerCluster {
            lat: lat_sum / count as f64,
            lon: lon_sum / count as f64,
            count,
        })
        .collect();
    clusters.sort_by(|a, b| {
        (a.lat, a.lon)
            .partial_cmp(&(b.lat, b.lon))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    clusters
}

fn string_column(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
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

fn float_column(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(column)
        .map_err(|_| DashboardError::ColumnNotFound(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const UTRECHT_WKT: &str = "POLYGON((5.0 52.0, 5.5 52.0, 5.5 52.3, 5.0 52.3, 5.0 52.0))";

    fn province_frame() -> DataFrame {
        df![
            "provincie" => ["Utrecht", "Flevoland"],
            "geometrie" => [UTRECHT_WKT, "not wkt at all"],
        ]
        .unwrap()
    }

    #[test]
    fn test_provinces_from_frame_skips_malformed_wkt() {
        let provinces = provinces_from_frame(&province_frame()).unwrap();
        assert_eq!(provinces.len(), 1);
        assert_eq!(provinces[0].name, "Utrecht");
        assert_eq!(provinces[0].geometry.0.len(), 1);
    }

    #[test]
    fn test_choropleth_join_excludes_unmatched_names() {
        let provinces = provinces_from_frame(&province_frame()).unwrap();
        let mut values = HashMap::new();
        values.insert("Utrecht".to_string(), 11.0);
        values.insert("Groningen".to_string(), 22.0); // no polygon

        let regions = choropleth_regions(&provinces, &values);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].name, "Utrecht");
        assert_eq!(regions[0].value, 11.0);
        assert!(regions[0].label_anchor.is_some());
    }

    #[test]
    fn test_average_power_by_province() {
        let df = df![
            "provincie" => [Some("Utrecht"), Some("Utrecht"), Some("Gelderland"), None],
            "vermogen_kw" => [Some(11.0f64), Some(22.0), Some(50.0), Some(7.0)],
        ]
        .unwrap();

        let averages = average_power_by_province(&df).unwrap();
        assert_eq!(averages.get("Utrecht"), Some(&16.5));
        assert_eq!(averages.get("Gelderland"), Some(&50.0));
        assert_eq!(averages.len(), 2);
    }

    #[test]
    fn test_stations_from_frame_drops_incomplete_rows() {
        let df = df![
            "lat" => [Some(52.09), None],
            "lon" => [Some(5.12), Some(5.3)],
            "vermogen_kw" => [Some(11.0f64), Some(22.0)],
            "connector" => [Some("CCS"), Some("Type2")],
        ]
        .unwrap();

        let stations = stations_from_frame(&df).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].connector, "CCS");
    }

    #[test]
    fn test_cluster_markers_groups_by_cell() {
        let stations = vec![
            StationPoint { lat: 52.01, lon: 5.01, power_kw: 11.0, connector: "CCS".into() },
            StationPoint { lat: 52.02, lon: 5.02, power_kw: 22.0, connector: "CCS".into() },
            StationPoint { lat: 53.50, lon: 6.50, power_kw: 50.0, connector: "CHAdeMO".into() },
        ];

        let clusters = cluster_markers(&stations, 0.5);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].count, 2);
        assert!((clusters[0].lat - 52.015).abs() < 1e-9);
        assert_eq!(clusters[1].count, 1);
    }

    #[test]
    fn test_cluster_markers_empty_input() {
        assert!(cluster_markers(&[], 0.5).is_empty());
    }
}
