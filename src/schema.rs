//! Column names of the source tables.
//!
//! The CSVs come straight from the Dutch open-data exports, so the column
//! names are kept as-is rather than translated.

/// Session start timestamp (day-first formatted in the source).
pub const COL_STARTED: &str = "gestart";
/// Session end timestamp (day-first formatted in the source).
pub const COL_ENDED: &str = "beeindigd";
/// Requested power in watts.
pub const COL_POWER_W: &str = "vermogen_w";
/// Hour of day the session started (0-23).
pub const COL_HOUR: &str = "uur";
/// Occupancy ratio as a percentage (0-100), decimal-comma encoded.
pub const COL_OCCUPANCY_PCT: &str = "bezetting_pct";
/// Consumed energy in watt-hours, decimal-comma encoded.
pub const COL_ENERGY_WH: &str = "verbruik_wh";
/// Coarse time-of-day bucket label (pivot row key).
pub const COL_BUCKET: &str = "blok";
/// Month-year label "mmm-YY" (pivot column key).
pub const COL_MAANDJAAR: &str = "maandjaar";

/// Vehicle brand.
pub const COL_BRAND: &str = "merk";
/// Vehicle model name as registered.
pub const COL_MODEL: &str = "handelsbenaming";
/// Catalog price in euros.
pub const COL_CATALOG_PRICE: &str = "catalogusprijs";
/// Top speed in km/h.
pub const COL_TOP_SPEED: &str = "topsnelheid";
/// Unladen mass in kg.
pub const COL_MASS: &str = "massa_ledig";
/// Hybrid/electric classification.
pub const COL_FUEL_CLASS: &str = "klasse";
/// First registration date (day-first formatted in the source).
pub const COL_FIRST_REGISTRATION: &str = "eerste_registratie";

/// Province name, the choropleth join key.
pub const COL_PROVINCE: &str = "provincie";
/// Polygon geometry encoded as well-known text.
pub const COL_GEOMETRY_WKT: &str = "geometrie";
/// Station latitude.
pub const COL_LAT: &str = "lat";
/// Station longitude.
pub const COL_LON: &str = "lon";
/// Station power rating in kW, decimal-comma encoded.
pub const COL_STATION_POWER_KW: &str = "vermogen_kw";
/// Station connector type.
pub const COL_CONNECTOR: &str = "connector";
