//! File-backed single-slot tracking store at ~/.ambutrack/AMB_DATA.json.
//!
//! One record, overwritten wholesale on every publish (last-write-wins).
//! Each publish stamps a sequence number one past the highest seen, so a
//! reader can tell a fresh record from one it already rendered.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::record::TrackingRecord;

/// Well-known slot name.
pub const SLOT_KEY: &str = "AMB_DATA";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Tracking store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Tracking record serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Handle on the shared slot.
pub struct TrackingStore {
    path: PathBuf,
    last_seq: u64,
}

impl TrackingStore {
    /// Open the slot at the default location.
    pub fn open() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Open the slot at a specific path (for testing and `--store`).
    pub fn load_from(path: PathBuf) -> Self {
        let last_seq = Self::read_file(&path).map(|r| r.seq).unwrap_or(0);
        Self { path, last_seq }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ambutrack")
            .join(format!("{}.json", SLOT_KEY))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Option<TrackingRecord> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ignoring malformed tracking record");
                None
            }
        }
    }

    /// Current record. Missing or malformed means "nothing to show yet".
    pub fn read(&self) -> Option<TrackingRecord> {
        Self::read_file(&self.path)
    }

    /// Overwrite the slot. Returns the record as stored, with its new `seq`.
    pub fn publish(&mut self, mut record: TrackingRecord) -> Result<TrackingRecord, StoreError> {
        // Another writer may have bumped the slot since we last looked.
        let on_disk = self.read().map(|r| r.seq).unwrap_or(0);
        record.seq = self.last_seq.max(on_disk) + 1;

        let json = serde_json::to_string_pretty(&record)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write-then-rename so readers never observe a half-written slot.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        self.last_seq = record.seq;
        Ok(record)
    }

    /// Remove the slot; absence means "no active tracking".
    pub fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Highest sequence number this handle has written or observed at open.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }
}
