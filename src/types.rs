//! Core data types and configuration for geoseek.
//!
//! The types here are deliberately plain: facilities are immutable records
//! supplied by an external data source, queries are ephemeral values, and
//! the configuration is serializable so deployments can tune precision and
//! grid size without recompiling.

use serde::de::Error;
use serde::{Deserialize, Serialize};

/// An immutable located entity supplied by the external data source.
///
/// The search core never mutates facilities; an index owns its copies for
/// the lifetime of one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Unique identifier
    pub id: u64,
    pub name: String,
    pub address: String,
    /// Latitude in degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, [-180, 180]
    pub lon: f64,
}

impl Facility {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        address: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            lat,
            lon,
        }
    }
}

/// A radius query against a built index. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusQuery {
    /// Query center latitude in degrees
    pub lat: f64,
    /// Query center longitude in degrees
    pub lon: f64,
    /// Search radius in meters
    pub radius_m: f64,
    /// Optional case-insensitive substring filter on facility names
    pub name_filter: Option<String>,
}

impl RadiusQuery {
    pub fn new(lat: f64, lon: f64, radius_m: f64) -> Self {
        Self {
            lat,
            lon,
            radius_m,
            name_filter: None,
        }
    }

    pub fn with_name_filter(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = Some(filter.into());
        self
    }
}

/// A single search result: a facility annotated with its great-circle
/// distance from the query center, in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub facility: Facility,
    pub distance_m: f64,
}

/// Engine configuration.
///
/// Serializable so deployments can load tuning from JSON or TOML. The
/// selector radius bands live in [`crate::search`] as named constants; this
/// struct covers the parameters that shape the index itself.
///
/// # Example
///
/// ```rust
/// use geoseek::Config;
///
/// let config = Config::default();
/// assert_eq!(config.geokey_precision, 6);
///
/// let json = r#"{ "geokey_precision": 7, "grid_size_deg": 0.02 }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.geokey_precision, 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Geokey precision for the bucket map (1-12, default: 6).
    /// Higher values mean smaller cells and more buckets.
    #[serde(default = "Config::default_geokey_precision")]
    pub geokey_precision: usize,

    /// Uniform grid cell size in degrees (default: 0.01, ~1.1 km of
    /// latitude). Independent of the geokey precision.
    #[serde(default = "Config::default_grid_size_deg")]
    pub grid_size_deg: f64,
}

impl Config {
    const fn default_geokey_precision() -> usize {
        6
    }

    const fn default_grid_size_deg() -> f64 {
        0.01
    }

    pub fn with_geokey_precision(precision: usize) -> Self {
        assert!(
            (1..=12).contains(&precision),
            "Geokey precision must be between 1 and 12"
        );

        Self {
            geokey_precision: precision,
            grid_size_deg: Self::default_grid_size_deg(),
        }
    }

    pub fn with_grid_size_deg(mut self, grid_size_deg: f64) -> Self {
        assert!(
            grid_size_deg > 0.0 && grid_size_deg.is_finite(),
            "Grid size must be positive and finite"
        );
        self.grid_size_deg = grid_size_deg;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=12).contains(&self.geokey_precision) {
            return Err("Geokey precision must be between 1 and 12".to_string());
        }

        if !self.grid_size_deg.is_finite() || self.grid_size_deg <= 0.0 {
            return Err("Grid size must be positive and finite".to_string());
        }
        if self.grid_size_deg > 1.0 {
            return Err("Grid size above 1 degree defeats the grid index".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geokey_precision: Self::default_geokey_precision(),
            grid_size_deg: Self::default_grid_size_deg(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.geokey_precision, 6);
        assert_eq!(config.grid_size_deg, 0.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_with_geokey_precision() {
        let config = Config::with_geokey_precision(8);
        assert_eq!(config.geokey_precision, 8);
    }

    #[test]
    #[should_panic(expected = "Geokey precision must be between 1 and 12")]
    fn test_config_invalid_precision() {
        Config::with_geokey_precision(15);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.geokey_precision = 13;
        assert!(config.validate().is_err());

        config.geokey_precision = 6;
        config.grid_size_deg = 0.0;
        assert!(config.validate().is_err());

        config.grid_size_deg = f64::NAN;
        assert!(config.validate().is_err());

        config.grid_size_deg = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::with_geokey_precision(7).with_grid_size_deg(0.02);

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();

        assert_eq!(deserialized.geokey_precision, 7);
        assert_eq!(deserialized.grid_size_deg, 0.02);
    }

    #[test]
    fn test_config_rejects_invalid_json() {
        let json = r#"{ "geokey_precision": 40 }"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_radius_query_builder() {
        let query = RadiusQuery::new(35.69, 139.70, 500.0).with_name_filter("clinic");
        assert_eq!(query.name_filter.as_deref(), Some("clinic"));
    }

    #[test]
    fn test_facility_round_trip() {
        let facility = Facility::new(7, "Central Library", "1-1 Chiyoda", 35.69, 139.75);
        let json = serde_json::to_string(&facility).unwrap();
        let back: Facility = serde_json::from_str(&json).unwrap();
        assert_eq!(back, facility);
    }
}
