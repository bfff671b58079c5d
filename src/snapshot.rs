//! Precomputed-index persistence.
//!
//! A snapshot stores the derived entry list, not the bucket or grid maps:
//! both maps are a pure function of the entries and are rebuilt on load
//! through [`FacilityIndex::from_entries`], so a loaded index has exactly
//! the same shape a live build would produce. This keeps the file format
//! small and makes the static-data pipeline (precompute offline, load at
//! startup) share every code path with the live-built index.

use crate::error::{GeoSeekError, Result};
use crate::index::{FacilityIndex, IndexedFacility};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

const SNAPSHOT_MAGIC: [u8; 4] = *b"GSKS";
const SNAPSHOT_VERSION: u16 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    magic: [u8; 4],
    version: u16,
    grid_size_deg: f64,
    entries: Vec<IndexedFacility>,
}

impl FacilityIndex {
    /// Write the index's entries to a snapshot file.
    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);

        let snapshot = SnapshotFile {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            grid_size_deg: self.grid_size_deg(),
            entries: self.entries().to_vec(),
        };

        bincode::serialize_into(writer, &snapshot)?;
        log::debug!(
            "saved snapshot: {} entries to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Load a snapshot and rebuild the bucket and grid maps from it.
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);

        let snapshot: SnapshotFile = bincode::deserialize_from(reader)?;
        if snapshot.magic != SNAPSHOT_MAGIC {
            return Err(GeoSeekError::InvalidInput(format!(
                "not a geoseek snapshot: {}",
                path.as_ref().display()
            )));
        }
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GeoSeekError::InvalidInput(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        FacilityIndex::from_entries(snapshot.entries, snapshot.grid_size_deg)
    }
}
