//! Base-32 hierarchical spatial keys.
//!
//! A geokey encodes a (latitude, longitude) pair by alternately bisecting
//! the longitude and latitude ranges, longitude first, packing 5 bits per
//! emitted symbol. Decoding a key yields the bounding rectangle of its cell;
//! the rectangle always contains the encoded point. Cell width in longitude
//! shrinks with |latitude| through the cosine term, so cells are not square
//! away from the equator — the neighbor-cell search strategies inherit that
//! asymmetry and it is the source of their recall risk near cell edges.

use crate::distance::haversine_distance_km;
use crate::error::{GeoSeekError, Result};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Base-32 alphabet: digits plus lowercase letters excluding a, i, l, o.
/// Shared with the hierarchical child-key expansion in [`crate::search`].
pub(crate) const BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Kilometers per degree of latitude (and of longitude at the equator)
pub const KM_PER_DEGREE: f64 = 111.0;

/// Reference latitude for the km/degree conversion in [`precision_info`].
///
/// Fixed for the deployment region (Kanto plain) instead of the query
/// latitude; a documented approximation that under-estimates cell width
/// nearer the equator and over-estimates it at higher latitudes.
pub const REFERENCE_LATITUDE_DEG: f64 = 35.7;

/// Upper bound on lattice steps per axis in [`keys_within_radius`]. Above
/// this the step is widened so the sample count stays bounded.
const MAX_LATTICE_STEPS: i64 = 64;

/// Bounding rectangle of a geokey cell, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl CellBounds {
    /// Whole-world bounds, the starting state of every encode/decode.
    fn world() -> Self {
        Self {
            lat_min: -90.0,
            lat_max: 90.0,
            lon_min: -180.0,
            lon_max: 180.0,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

/// Result of decoding a geokey: the cell midpoint, the per-axis error
/// half-widths, and the full bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedCell {
    pub lat: f64,
    pub lon: f64,
    /// Half the cell height in degrees
    pub lat_error: f64,
    /// Half the cell width in degrees
    pub lon_error: f64,
    pub bounds: CellBounds,
}

/// Static error bounds for a precision level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionInfo {
    pub lat_error_deg: f64,
    pub lon_error_deg: f64,
    /// Cell height estimate in kilometers
    pub cell_km_lat: f64,
    /// Cell width estimate in kilometers, at [`REFERENCE_LATITUDE_DEG`]
    pub cell_km_lon: f64,
}

fn check_precision(precision: usize) -> Result<()> {
    if !(1..=12).contains(&precision) {
        return Err(GeoSeekError::InvalidPrecision(precision));
    }
    Ok(())
}

pub(crate) fn check_coordinate(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(GeoSeekError::InvalidCoordinate { lat, lon });
    }
    Ok(())
}

/// Encode a coordinate into a geokey of the given precision.
///
/// # Errors
///
/// `InvalidCoordinate` for out-of-range or non-finite coordinates,
/// `InvalidPrecision` for precision outside 1..=12.
///
/// # Examples
///
/// ```rust
/// use geoseek::geokey::encode;
///
/// let key = encode(35.690, 139.700, 6).unwrap();
/// assert_eq!(key.len(), 6);
/// ```
pub fn encode(lat: f64, lon: f64, precision: usize) -> Result<String> {
    check_precision(precision)?;
    check_coordinate(lat, lon)?;

    let mut bounds = CellBounds::world();
    let mut key = String::with_capacity(precision);
    let mut symbol: usize = 0;
    let mut bit = 0;
    let mut even = true; // even bit index splits longitude

    while key.len() < precision {
        symbol <<= 1;
        if even {
            let mid = (bounds.lon_min + bounds.lon_max) / 2.0;
            if lon >= mid {
                symbol |= 1;
                bounds.lon_min = mid;
            } else {
                bounds.lon_max = mid;
            }
        } else {
            let mid = (bounds.lat_min + bounds.lat_max) / 2.0;
            if lat >= mid {
                symbol |= 1;
                bounds.lat_min = mid;
            } else {
                bounds.lat_max = mid;
            }
        }

        even = !even;
        bit += 1;
        if bit == 5 {
            key.push(BASE32[symbol] as char);
            symbol = 0;
            bit = 0;
        }
    }

    Ok(key)
}

fn symbol_index(c: char) -> Option<usize> {
    let lower = c.to_ascii_lowercase();
    BASE32.iter().position(|&b| b as char == lower)
}

/// Decode a geokey back to its cell. Case-insensitive.
///
/// # Errors
///
/// `InvalidGeoKeyCharacter` for any symbol outside the alphabet,
/// `InvalidPrecision` for empty or overlong keys.
pub fn decode(key: &str) -> Result<DecodedCell> {
    check_precision(key.chars().count())?;

    let mut bounds = CellBounds::world();
    let mut even = true;

    for c in key.chars() {
        let idx = symbol_index(c).ok_or(GeoSeekError::InvalidGeoKeyCharacter(c))?;

        for shift in (0..5).rev() {
            let bit = (idx >> shift) & 1;
            if even {
                let mid = (bounds.lon_min + bounds.lon_max) / 2.0;
                if bit == 1 {
                    bounds.lon_min = mid;
                } else {
                    bounds.lon_max = mid;
                }
            } else {
                let mid = (bounds.lat_min + bounds.lat_max) / 2.0;
                if bit == 1 {
                    bounds.lat_min = mid;
                } else {
                    bounds.lat_max = mid;
                }
            }
            even = !even;
        }
    }

    Ok(DecodedCell {
        lat: (bounds.lat_min + bounds.lat_max) / 2.0,
        lon: (bounds.lon_min + bounds.lon_max) / 2.0,
        lat_error: (bounds.lat_max - bounds.lat_min) / 2.0,
        lon_error: (bounds.lon_max - bounds.lon_min) / 2.0,
        bounds,
    })
}

/// Static error bounds and cell-size estimates for a precision level.
///
/// Precision `p` spends `floor(5p/2)` bits on latitude and `ceil(5p/2)` on
/// longitude. The km conversion uses [`REFERENCE_LATITUDE_DEG`], not the
/// query point.
pub fn precision_info(precision: usize) -> Result<PrecisionInfo> {
    check_precision(precision)?;

    let lat_bits = (5 * precision) / 2;
    let lon_bits = (5 * precision).div_ceil(2);

    let lat_error_deg = 180.0 / 2f64.powi(lat_bits as i32);
    let lon_error_deg = 360.0 / 2f64.powi(lon_bits as i32);

    Ok(PrecisionInfo {
        lat_error_deg,
        lon_error_deg,
        cell_km_lat: lat_error_deg * KM_PER_DEGREE,
        cell_km_lon: lon_error_deg * KM_PER_DEGREE * REFERENCE_LATITUDE_DEG.to_radians().cos(),
    })
}

/// Wrap a longitude across the antimeridian: 181.0 becomes -179.0.
fn wrap_lon(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// The 8 compass offsets, (d_lat, d_lon), north-west first.
const COMPASS_OFFSETS: [(f64, f64); 8] = [
    (1.0, -1.0),
    (1.0, 0.0),
    (1.0, 1.0),
    (0.0, -1.0),
    (0.0, 1.0),
    (-1.0, -1.0),
    (-1.0, 0.0),
    (-1.0, 1.0),
];

/// Derive the adjacent cells of a geokey.
///
/// Offsets the decoded cell center by a full cell width per axis (twice the
/// error half-width, landing on the neighbor's center), clamps latitude at
/// the poles, wraps longitude across the antimeridian, and re-encodes at the
/// same precision. The result excludes the input key and is deduplicated, so
/// cells at the poles yield fewer than 8 neighbors — that is correct, not an
/// error.
pub fn neighbors(key: &str) -> Result<SmallVec<[String; 8]>> {
    let cell = decode(key)?;
    let precision = key.chars().count();
    let canonical = encode(cell.lat, cell.lon, precision)?;

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut out = SmallVec::new();

    for (d_lat, d_lon) in COMPASS_OFFSETS {
        let lat = (cell.lat + 2.0 * cell.lat_error * d_lat).clamp(-90.0, 90.0);
        let lon = wrap_lon(cell.lon + 2.0 * cell.lon_error * d_lon);

        let neighbor = encode(lat, lon, precision)?;
        if neighbor != canonical && seen.insert(neighbor.clone()) {
            out.push(neighbor);
        }
    }

    Ok(out)
}

/// Collect the geokeys of every cell a radius could touch, by sampling a
/// square lattice around the center.
///
/// The lattice step is half the smaller cell-dimension estimate, and the
/// acceptance reach extends one cell diagonal past the radius. Together
/// these guarantee that every cell the disk touches, including cells
/// reached only across a corner and cells whose overlap with the disk is
/// smaller than one step, keeps at least one sample. This over-includes
/// near the rim by design — the candidate set only narrows the search, the
/// exact distance filter runs afterwards. For radii far above the cell
/// size the step is widened to keep the sample count bounded, trading a
/// residual skip risk at the rim for time.
pub fn keys_within_radius(
    lat: f64,
    lon: f64,
    radius_km: f64,
    precision: usize,
) -> Result<FxHashSet<String>> {
    check_precision(precision)?;
    check_coordinate(lat, lon)?;
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(GeoSeekError::InvalidInput(format!(
            "radius must be non-negative and finite, got {radius_km}"
        )));
    }

    let info = precision_info(precision)?;

    // A cell intersecting the disk can hold samples up to one cell diagonal
    // past the rim; accepting out to that reach keeps a sample in every
    // such cell even when the radius itself is smaller than one step.
    let slack_km = info.cell_km_lat.hypot(info.cell_km_lon);
    let reach_km = radius_km + slack_km;

    let mut step_km = 0.5 * info.cell_km_lat.min(info.cell_km_lon);
    if reach_km / step_km > MAX_LATTICE_STEPS as f64 {
        step_km = reach_km / MAX_LATTICE_STEPS as f64;
    }

    let lat_step_deg = step_km / KM_PER_DEGREE;
    let lon_step_deg = step_km / (KM_PER_DEGREE * REFERENCE_LATITUDE_DEG.to_radians().cos());
    let steps = ((reach_km / step_km).ceil() as i64).min(MAX_LATTICE_STEPS);

    let mut keys = FxHashSet::default();
    keys.insert(encode(lat, lon, precision)?);

    for dy in -steps..=steps {
        for dx in -steps..=steps {
            let sample_lat = (lat + dy as f64 * lat_step_deg).clamp(-90.0, 90.0);
            let sample_lon = wrap_lon(lon + dx as f64 * lon_step_deg);

            if haversine_distance_km(lat, lon, sample_lat, sample_lon) <= reach_km {
                keys.insert(encode(sample_lat, sample_lon, precision)?);
            }
        }
    }

    Ok(keys)
}
