//! Published-index lifecycle: build, swap, query.
//!
//! The store owns an `Arc` to the currently published index behind a
//! `parking_lot::RwLock`. A rebuild happens entirely outside the lock and
//! is published with a single pointer swap, so concurrent readers either
//! see the previous complete index or the new complete index — never a
//! partially populated one. Queries against a published index take no lock
//! beyond the `Arc` clone; the index itself is immutable.

use crate::error::{GeoSeekError, Result};
use crate::index::FacilityIndex;
use crate::search::{SearchMethod, recommended_method};
use crate::types::{Config, Facility, RadiusQuery, SearchHit};
use parking_lot::RwLock;
use std::sync::Arc;

/// Strategy choice for [`IndexStore::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodChoice {
    /// Let the selector pick by radius band and dataset size
    #[default]
    Auto,
    Fixed(SearchMethod),
}

/// Holder for the process's current facility index.
///
/// Owned by the caller (typically one per facility-type selection), never a
/// mutable global. Before the first publish, queries fail with
/// [`GeoSeekError::IndexNotReady`] rather than silently returning nothing.
///
/// # Examples
///
/// ```rust
/// use geoseek::{Config, Facility, IndexStore, MethodChoice, RadiusQuery};
///
/// let store = IndexStore::new();
/// store.rebuild(
///     vec![Facility::new(1, "Depot", "1-1", 35.69, 139.70)],
///     &Config::default(),
/// )?;
///
/// let hits = store.search(&RadiusQuery::new(35.69, 139.70, 500.0), MethodChoice::Auto)?;
/// assert_eq!(hits.len(), 1);
/// # Ok::<(), geoseek::GeoSeekError>(())
/// ```
pub struct IndexStore {
    current: RwLock<Option<Arc<FacilityIndex>>>,
}

impl IndexStore {
    /// Create an empty store; queries fail with `IndexNotReady` until the
    /// first publish.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Build an index from a fresh dataset and publish it atomically.
    ///
    /// The previous index stays visible to readers until the swap; in-flight
    /// queries holding an `Arc` keep their snapshot alive.
    pub fn rebuild(&self, facilities: Vec<Facility>, config: &Config) -> Result<Arc<FacilityIndex>> {
        let index = Arc::new(FacilityIndex::build(facilities, config)?);
        self.publish(Arc::clone(&index));
        Ok(index)
    }

    /// Publish an already built index (e.g. one loaded from a snapshot).
    pub fn publish(&self, index: Arc<FacilityIndex>) {
        *self.current.write() = Some(index);
    }

    /// The currently published index.
    pub fn current(&self) -> Result<Arc<FacilityIndex>> {
        self.current
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(GeoSeekError::IndexNotReady)
    }

    /// Whether an index has been published.
    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    /// Drop the published index, returning the store to the not-ready state.
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// Run a range query against the published index.
    pub fn search(&self, query: &RadiusQuery, choice: MethodChoice) -> Result<Vec<SearchHit>> {
        let index = self.current()?;
        let method = match choice {
            MethodChoice::Fixed(method) => method,
            MethodChoice::Auto => recommended_method(query.radius_m, index.len(), true),
        };
        index.search(method, query)
    }
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}
