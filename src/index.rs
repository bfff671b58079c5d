//! Bucket-map and grid-map index construction over a facility dataset.
//!
//! A build is a synchronous, one-shot batch: every facility is tagged with
//! its geokey and neighbor keys once, then inserted into two independent
//! structures in the same pass — a geokey bucket map and a fixed-size
//! uniform grid. The result is immutable; dataset changes are handled by
//! rebuilding and swapping through [`crate::store::IndexStore`], never by
//! mutating a live index.

use crate::error::{GeoSeekError, Result};
use crate::geokey;
use crate::types::{Config, Facility};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::{Duration, Instant};

/// A facility plus the spatial keys derived for it at build time.
/// Never recomputed per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFacility {
    pub facility: Facility,
    /// Geokey at the index's build precision
    pub key: String,
    /// The ≤8 adjacent cells of `key`
    pub neighbor_keys: SmallVec<[String; 8]>,
    pub precision: usize,
}

/// Build statistics recorded by [`FacilityIndex::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub total_entries: usize,
    /// Occupied geokey cells
    pub total_cells: usize,
    pub avg_entries_per_cell: f64,
    pub max_entries_per_cell: usize,
    pub build_time: Duration,
}

/// Diagnostics snapshot for operators, derived from a built index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub cell_count: usize,
    pub grid_cell_count: usize,
    pub avg_entries_per_cell: f64,
    pub build_time: Duration,
    /// Rough heap estimate in bytes
    pub memory_estimate: usize,
    pub precision: usize,
}

/// An immutable spatial index over one facility dataset.
///
/// Buckets and grid cells hold indices into the entry vector, so each
/// facility is stored once and candidate sets stay cheap to merge and
/// dedupe. Read-only after build; safe to share behind an `Arc`.
pub struct FacilityIndex {
    entries: Vec<IndexedFacility>,
    /// geokey -> entry indices
    buckets: FxHashMap<String, Vec<usize>>,
    /// (floor(lat/size), floor(lon/size)) -> entry indices
    grid: FxHashMap<(i64, i64), Vec<usize>>,
    /// (min, max) occupied grid cells, None for an empty index
    grid_extent: Option<((i64, i64), (i64, i64))>,
    precision: usize,
    grid_size_deg: f64,
    stats: IndexStats,
}

impl FacilityIndex {
    /// Build an index over a dataset.
    ///
    /// An empty dataset produces a valid empty index. A facility with
    /// out-of-range coordinates fails the whole build — bad records are a
    /// data-source defect, not something to drop silently.
    pub fn build(facilities: Vec<Facility>, config: &Config) -> Result<Self> {
        config.validate().map_err(GeoSeekError::InvalidInput)?;

        let started = Instant::now();
        let precision = config.geokey_precision;
        let grid_size_deg = config.grid_size_deg;

        let mut entries = Vec::with_capacity(facilities.len());
        let mut buckets: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut grid: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();

        for facility in facilities {
            let key = geokey::encode(facility.lat, facility.lon, precision)
                .inspect_err(|_| {
                    log::warn!(
                        "rejecting dataset: facility {} has invalid coordinates ({}, {})",
                        facility.id,
                        facility.lat,
                        facility.lon
                    )
                })?;
            let neighbor_keys = geokey::neighbors(&key)?;
            let grid_cell = grid_cell_of(facility.lat, facility.lon, grid_size_deg);

            let idx = entries.len();
            buckets.entry(key.clone()).or_default().push(idx);
            grid.entry(grid_cell).or_default().push(idx);

            entries.push(IndexedFacility {
                facility,
                key,
                neighbor_keys,
                precision,
            });
        }

        let stats = compute_stats(&entries, &buckets, started.elapsed());
        log::debug!(
            "built index: {} entries, {} cells, avg {:.1}/cell, max {}/cell in {:?}",
            stats.total_entries,
            stats.total_cells,
            stats.avg_entries_per_cell,
            stats.max_entries_per_cell,
            stats.build_time
        );

        Ok(Self {
            grid_extent: compute_grid_extent(&grid),
            entries,
            buckets,
            grid,
            precision,
            grid_size_deg,
            stats,
        })
    }

    /// Rebuild an index from previously derived entries.
    ///
    /// The bucket and grid maps are reconstructed from the stored keys, so a
    /// precomputed index loaded from a snapshot has exactly the same shape
    /// as a live-built one. Entries must all carry the same precision.
    pub fn from_entries(entries: Vec<IndexedFacility>, grid_size_deg: f64) -> Result<Self> {
        let started = Instant::now();

        let precision = match entries.first() {
            Some(entry) => entry.precision,
            None => Config::default().geokey_precision,
        };
        if let Some(entry) = entries.iter().find(|e| e.precision != precision) {
            return Err(GeoSeekError::InvalidInput(format!(
                "mixed precisions in entry set: {} vs {}",
                precision, entry.precision
            )));
        }
        if !(0.0..=1.0).contains(&grid_size_deg) || grid_size_deg == 0.0 {
            return Err(GeoSeekError::InvalidInput(format!(
                "invalid grid size: {grid_size_deg}"
            )));
        }

        let mut buckets: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut grid: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();

        for (idx, entry) in entries.iter().enumerate() {
            buckets.entry(entry.key.clone()).or_default().push(idx);
            grid.entry(grid_cell_of(
                entry.facility.lat,
                entry.facility.lon,
                grid_size_deg,
            ))
            .or_default()
            .push(idx);
        }

        let stats = compute_stats(&entries, &buckets, started.elapsed());

        Ok(Self {
            grid_extent: compute_grid_extent(&grid),
            entries,
            buckets,
            grid,
            precision,
            grid_size_deg,
            stats,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn grid_size_deg(&self) -> f64 {
        self.grid_size_deg
    }

    /// Approximate grid cell extent in meters, along the latitude axis.
    /// The east-west extent shrinks with |latitude|; callers that step the
    /// grid use this single figure and accept the asymmetry.
    pub fn grid_cell_size_m(&self) -> f64 {
        self.grid_size_deg * geokey::KM_PER_DEGREE * 1000.0
    }

    pub fn entries(&self) -> &[IndexedFacility] {
        &self.entries
    }

    pub fn bucket(&self, key: &str) -> Option<&[usize]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn bucket_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.buckets.keys().map(String::as_str)
    }

    pub fn grid_bucket(&self, cell: (i64, i64)) -> Option<&[usize]> {
        self.grid.get(&cell).map(Vec::as_slice)
    }

    /// Grid cell of a coordinate under this index's grid size.
    pub fn grid_cell(&self, lat: f64, lon: f64) -> (i64, i64) {
        grid_cell_of(lat, lon, self.grid_size_deg)
    }

    /// Bounding box of the occupied grid cells, as (min, max) corners.
    /// `None` for an empty index.
    pub fn grid_extent(&self) -> Option<((i64, i64), (i64, i64))> {
        self.grid_extent
    }

    /// Build statistics snapshot.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Operator diagnostics, including a rough memory estimate.
    pub fn info(&self) -> IndexInfo {
        let entry_bytes: usize = self
            .entries
            .iter()
            .map(|e| {
                std::mem::size_of::<IndexedFacility>()
                    + e.facility.name.len()
                    + e.facility.address.len()
                    + e.key.len()
                    + e.neighbor_keys.iter().map(String::len).sum::<usize>()
            })
            .sum();
        // Bucket/grid maps hold one usize per entry each, plus key overhead
        let map_bytes = self.entries.len() * 2 * std::mem::size_of::<usize>()
            + self.buckets.keys().map(|k| k.len() + 48).sum::<usize>()
            + self.grid.len() * 64;

        IndexInfo {
            cell_count: self.buckets.len(),
            grid_cell_count: self.grid.len(),
            avg_entries_per_cell: self.stats.avg_entries_per_cell,
            build_time: self.stats.build_time,
            memory_estimate: entry_bytes + map_bytes,
            precision: self.precision,
        }
    }
}

fn grid_cell_of(lat: f64, lon: f64, grid_size_deg: f64) -> (i64, i64) {
    (
        (lat / grid_size_deg).floor() as i64,
        (lon / grid_size_deg).floor() as i64,
    )
}

fn compute_grid_extent(
    grid: &FxHashMap<(i64, i64), Vec<usize>>,
) -> Option<((i64, i64), (i64, i64))> {
    let mut cells = grid.keys();
    let first = *cells.next()?;
    let (mut min, mut max) = (first, first);
    for &(cell_lat, cell_lon) in cells {
        min.0 = min.0.min(cell_lat);
        min.1 = min.1.min(cell_lon);
        max.0 = max.0.max(cell_lat);
        max.1 = max.1.max(cell_lon);
    }
    Some((min, max))
}

fn compute_stats(
    entries: &[IndexedFacility],
    buckets: &FxHashMap<String, Vec<usize>>,
    build_time: Duration,
) -> IndexStats {
    let max_entries_per_cell = buckets.values().map(Vec::len).max().unwrap_or(0);
    let avg_entries_per_cell = if buckets.is_empty() {
        0.0
    } else {
        entries.len() as f64 / buckets.len() as f64
    };

    IndexStats {
        total_entries: entries.len(),
        total_cells: buckets.len(),
        avg_entries_per_cell,
        max_entries_per_cell,
        build_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_facilities() -> Vec<Facility> {
        vec![
            Facility::new(1, "Station North", "1-1 Kita", 35.690, 139.700),
            Facility::new(2, "Station South", "1-2 Minami", 35.691, 139.701),
            Facility::new(3, "River Depot", "9-9 Kawa", 35.750, 139.800),
        ]
    }

    #[test]
    fn test_build_tags_entries_once() {
        let index = FacilityIndex::build(sample_facilities(), &Config::default()).unwrap();

        assert_eq!(index.len(), 3);
        for entry in index.entries() {
            let expected =
                geokey::encode(entry.facility.lat, entry.facility.lon, index.precision()).unwrap();
            assert_eq!(entry.key, expected);
            assert_eq!(entry.precision, 6);
            assert_eq!(entry.neighbor_keys.len(), 8);
        }
    }

    #[test]
    fn test_build_bucket_membership() {
        let index = FacilityIndex::build(sample_facilities(), &Config::default()).unwrap();

        // A and B share one precision-6 cell, C is far away
        let key_ab = geokey::encode(35.690, 139.700, 6).unwrap();
        let bucket = index.bucket(&key_ab).unwrap();
        assert_eq!(bucket.len(), 2);

        assert_eq!(index.stats().total_cells, 2);
        assert_eq!(index.stats().max_entries_per_cell, 2);
        assert_eq!(index.bucket_keys().count(), 2);
    }

    #[test]
    fn test_every_entry_in_exactly_one_grid_bucket() {
        let index = FacilityIndex::build(sample_facilities(), &Config::default()).unwrap();

        // Each entry is present in the bucket computed from its own coordinates
        for (entry_idx, entry) in index.entries().iter().enumerate() {
            let cell = index.grid_cell(entry.facility.lat, entry.facility.lon);
            let bucket = index.grid_bucket(cell).unwrap();
            assert!(bucket.contains(&entry_idx));
        }

        // And nowhere else: total grid membership equals the entry count
        let total: usize = index
            .entries()
            .iter()
            .map(|e| index.grid_cell(e.facility.lat, e.facility.lon))
            .collect::<rustc_hash::FxHashSet<_>>()
            .into_iter()
            .map(|cell| index.grid_bucket(cell).unwrap().len())
            .sum();
        assert_eq!(total, index.len());
    }

    #[test]
    fn test_grid_extent_spans_occupied_cells() {
        let index = FacilityIndex::build(sample_facilities(), &Config::default()).unwrap();
        let (min, max) = index.grid_extent().unwrap();

        for entry in index.entries() {
            let cell = index.grid_cell(entry.facility.lat, entry.facility.lon);
            assert!(cell.0 >= min.0 && cell.0 <= max.0);
            assert!(cell.1 >= min.1 && cell.1 <= max.1);
        }

        let empty = FacilityIndex::build(Vec::new(), &Config::default()).unwrap();
        assert!(empty.grid_extent().is_none());
    }

    #[test]
    fn test_empty_dataset_is_valid() {
        let index = FacilityIndex::build(Vec::new(), &Config::default()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.stats().total_cells, 0);
        assert_eq!(index.stats().avg_entries_per_cell, 0.0);
        assert_eq!(index.stats().max_entries_per_cell, 0);
    }

    #[test]
    fn test_build_rejects_invalid_coordinates() {
        let facilities = vec![Facility::new(1, "Nowhere", "", 95.0, 0.0)];
        assert!(FacilityIndex::build(facilities, &Config::default()).is_err());
    }

    #[test]
    fn test_grid_cells_negative_coordinates_floor() {
        let index = FacilityIndex::build(Vec::new(), &Config::default()).unwrap();
        // floor, not truncation: -0.005 / 0.01 lands in cell -1
        assert_eq!(index.grid_cell(-0.005, -0.005), (-1, -1));
        assert_eq!(index.grid_cell(0.005, 0.005), (0, 0));
    }

    #[test]
    fn test_from_entries_round_trips_shape() {
        let built = FacilityIndex::build(sample_facilities(), &Config::default()).unwrap();
        let entries = built.entries().to_vec();

        let rebuilt = FacilityIndex::from_entries(entries, built.grid_size_deg()).unwrap();

        assert_eq!(rebuilt.len(), built.len());
        assert_eq!(rebuilt.precision(), built.precision());
        assert_eq!(rebuilt.stats().total_cells, built.stats().total_cells);
        for entry in built.entries() {
            assert!(rebuilt.bucket(&entry.key).is_some());
        }
    }

    #[test]
    fn test_from_entries_rejects_mixed_precision() {
        let built = FacilityIndex::build(sample_facilities(), &Config::default()).unwrap();
        let mut entries = built.entries().to_vec();
        entries[0].precision = 7;

        assert!(FacilityIndex::from_entries(entries, 0.01).is_err());
    }

    #[test]
    fn test_info_reports_memory_and_precision() {
        let index = FacilityIndex::build(sample_facilities(), &Config::default()).unwrap();
        let info = index.info();

        assert_eq!(info.precision, 6);
        assert_eq!(info.cell_count, 2);
        assert!(info.memory_estimate > 0);
        assert!(info.grid_cell_count >= 1);
    }
}
