//! Geohash-bucketed spatial indexing and nearest-facility range search.
//!
//! ```rust
//! use geoseek::{Config, Facility, IndexStore, MethodChoice, RadiusQuery};
//!
//! let store = IndexStore::new();
//! store.rebuild(
//!     vec![
//!         Facility::new(1, "North Clinic", "1-1 Kita", 35.690, 139.700),
//!         Facility::new(2, "South Clinic", "1-2 Minami", 35.691, 139.701),
//!     ],
//!     &Config::default(),
//! )?;
//!
//! let hits = store.search(&RadiusQuery::new(35.690, 139.700, 500.0), MethodChoice::Auto)?;
//! assert_eq!(hits.len(), 2);
//! # Ok::<(), geoseek::GeoSeekError>(())
//! ```

pub mod distance;
pub mod error;
pub mod geokey;
pub mod index;
pub mod search;
pub mod store;
pub mod types;

#[cfg(feature = "snapshot")]
pub mod snapshot;

pub use error::{GeoSeekError, Result};

pub use types::{Config, Facility, RadiusQuery, SearchHit};

pub use geokey::{CellBounds, DecodedCell, PrecisionInfo};

pub use index::{FacilityIndex, IndexInfo, IndexStats, IndexedFacility};

pub use search::{MethodReport, SearchMethod, recommended_method};

pub use store::{IndexStore, MethodChoice};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Config, Facility, GeoSeekError, RadiusQuery, Result, SearchHit};

    pub use crate::{FacilityIndex, IndexStore, MethodChoice, SearchMethod};

    pub use crate::distance::haversine_distance;

    pub use crate::geokey::{decode, encode, neighbors, precision_info};
}
