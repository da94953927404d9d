//! Pipeline configuration.
//!
//! One immutable [`DashboardConfig`] describes where the source tables
//! live and how they are delimited. Built once per invocation via the
//! builder; views receive it by reference and never mutate it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the dashboard pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use laadview::DashboardConfig;
///
/// let config = DashboardConfig::builder()
///     .sessions_path("data/laadsessies.csv")
///     .delimiter(b';')
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// The charging-session export. Every view needs it.
    pub sessions_path: PathBuf,

    /// The vehicle registration export; only the vehicle view needs it.
    pub vehicles_path: Option<PathBuf>,

    /// Province polygons (WKT column); only the map view needs it.
    pub provinces_path: Option<PathBuf>,

    /// Charging-station points; only the map view needs it.
    pub stations_path: Option<PathBuf>,

    /// Field delimiter of the exports. Default: `;`
    pub delimiter: u8,

    /// Remote source for the vehicle export, fetched once at cold start
    /// when `vehicles_path` does not exist yet.
    pub vehicle_source_url: Option<String>,

    /// Cell size in degrees for marker clustering. Default: 0.1
    pub cluster_cell_deg: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sessions_path: PathBuf::from("data/laadsessies.csv"),
            vehicles_path: None,
            provinces_path: None,
            stations_path: None,
            delimiter: b';',
            vehicle_source_url: None,
            cluster_cell_deg: 0.1,
        }
    }
}

impl DashboardConfig {
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.delimiter != b';' && self.delimiter != b',' {
            return Err(ConfigValidationError::InvalidDelimiter(
                self.delimiter as char,
            ));
        }
        if !self.cluster_cell_deg.is_finite() || self.cluster_cell_deg <= 0.0 {
            return Err(ConfigValidationError::InvalidClusterCell(
                self.cluster_cell_deg,
            ));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid delimiter '{0}' (expected ';' or ',')")]
    InvalidDelimiter(char),

    #[error("Invalid cluster cell size: {0} (must be a positive number of degrees)")]
    InvalidClusterCell(f64),
}

/// Builder for [`DashboardConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    sessions_path: Option<PathBuf>,
    vehicles_path: Option<PathBuf>,
    provinces_path: Option<PathBuf>,
    stations_path: Option<PathBuf>,
    delimiter: Option<u8>,
    vehicle_source_url: Option<String>,
    cluster_cell_deg: Option<f64>,
}

impl DashboardConfigBuilder {
    pub fn sessions_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sessions_path = Some(path.into());
        self
    }

    pub fn vehicles_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vehicles_path = Some(path.into());
        self
    }

    pub fn provinces_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.provinces_path = Some(path.into());
        self
    }

    pub fn stations_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stations_path = Some(path.into());
        self
    }

    /// Set the field delimiter (`;` or `,`).
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn vehicle_source_url(mut self, url: impl Into<String>) -> Self {
        self.vehicle_source_url = Some(url.into());
        self
    }

    /// Set the marker-cluster cell size in degrees.
    pub fn cluster_cell_deg(mut self, deg: f64) -> Self {
        self.cluster_cell_deg = Some(deg);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DashboardConfig` or an error if validation fails.
    pub fn build(self) -> Result<DashboardConfig, ConfigValidationError> {
        let defaults = DashboardConfig::default();
        let config = DashboardConfig {
            sessions_path: self.sessions_path.unwrap_or(defaults.sessions_path),
            vehicles_path: self.vehicles_path,
            provinces_path: self.provinces_path,
            stations_path: self.stations_path,
            delimiter: self.delimiter.unwrap_or(defaults.delimiter),
            vehicle_source_url: self.vehicle_source_url,
            cluster_cell_deg: self.cluster_cell_deg.unwrap_or(defaults.cluster_cell_deg),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.delimiter, b';');
        assert_eq!(config.cluster_cell_deg, 0.1);
        assert!(config.vehicles_path.is_none());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = DashboardConfig::builder()
            .sessions_path("sessies.csv")
            .vehicles_path("voertuigen.csv")
            .delimiter(b',')
            .cluster_cell_deg(0.25)
            .build()
            .unwrap();

        assert_eq!(config.sessions_path, PathBuf::from("sessies.csv"));
        assert_eq!(config.vehicles_path, Some(PathBuf::from("voertuigen.csv")));
        assert_eq!(config.delimiter, b',');
        assert_eq!(config.cluster_cell_deg, 0.25);
    }

    #[test]
    fn test_validation_rejects_exotic_delimiter() {
        let result = DashboardConfig::builder().delimiter(b'\t').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDelimiter('\t')
        ));
    }

    #[test]
    fn test_validation_rejects_nonpositive_cell() {
        let result = DashboardConfig::builder().cluster_cell_deg(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidClusterCell(_)
        ));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = DashboardConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: DashboardConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.sessions_path, deserialized.sessions_path);
        assert_eq!(config.delimiter, deserialized.delimiter);
    }
}
