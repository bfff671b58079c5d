//! Error types for geoseek operations.

use thiserror::Error;

/// Errors produced by the codec, index builder, and search paths.
#[derive(Debug, Error)]
pub enum GeoSeekError {
    /// Coordinate outside [-90, 90] latitude / [-180, 180] longitude
    #[error("invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// Geokey precision outside the supported 1..=12 range
    #[error("invalid geokey precision: {0} (expected 1..=12)")]
    InvalidPrecision(usize),

    /// Decode encountered a symbol outside the base-32 alphabet
    #[error("invalid geokey character: {0:?}")]
    InvalidGeoKeyCharacter(char),

    /// Search method name did not match any known strategy
    #[error("unknown search method: {0:?}")]
    UnknownMethod(String),

    /// Query issued before any index was published
    #[error("spatial index is not ready")]
    IndexNotReady,

    /// Generic invalid argument with context
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error from the snapshot layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encode/decode error
    #[cfg(feature = "snapshot")]
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type alias for geoseek operations
pub type Result<T> = std::result::Result<T, GeoSeekError>;
