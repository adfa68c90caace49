//! # Snapshot Persistence
//!
//! Saves a root navigator's state to `<state_dir>/navigator.json` so the
//! navigation hierarchy survives a restart.
//!
//! The file holds the saved state plus the time it was written. All writes
//! use atomic rename (write `.tmp`, then `rename()`) for crash safety.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::state::NavigatorState;

const SNAPSHOT_FILE: &str = "navigator.json";

/// On-disk layout of a snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub saved_at: DateTime<Utc>,
    pub state: NavigatorState,
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(io::Error),
    Codec(serde_json::Error),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "snapshot I/O error: {e}"),
            SnapshotError::Codec(e) => write!(f, "snapshot codec error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<io::Error> for SnapshotError {
    fn from(e: io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Codec(e)
    }
}

/// Reads and writes the snapshot file inside one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Writes `state`, stamped with the current time.
    pub fn save(&self, state: &NavigatorState) -> Result<Snapshot, SnapshotError> {
        fs::create_dir_all(&self.dir)?;
        let snapshot = Snapshot {
            saved_at: Utc::now(),
            state: state.clone(),
        };
        atomic_write_json(&self.path(), &snapshot)?;
        debug!("Snapshot saved to {}", self.path().display());
        Ok(snapshot)
    }

    /// Loads the snapshot. `Ok(None)` when none was saved yet.
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        let snapshot: Snapshot = serde_json::from_str(&json)?;
        debug!(
            "Snapshot loaded from {} (saved {})",
            path.display(),
            snapshot.saved_at.to_rfc3339()
        );
        Ok(Some(snapshot))
    }

    /// Removes the snapshot if there is one.
    pub fn clear(&self) -> Result<(), SnapshotError> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path)?;
            debug!("Snapshot removed: {}", path.display());
        }
        Ok(())
    }

    /// Like [`load`](Self::load), but treats an unreadable snapshot as
    /// missing. The failure is logged.
    pub fn load_or_warn(&self) -> Option<Snapshot> {
        match self.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Ignoring unreadable snapshot: {}", e);
                None
            }
        }
    }
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), SnapshotError> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
