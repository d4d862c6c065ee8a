//! Flat-file store for the set of listing ids seen in prior runs.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Ids of every listing observed by the previous successful run.
pub type SeenSet = HashSet<String>;

pub const STATE_FILE: &str = "seen_cars.json";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file serialization failed: {0}")]
    Format(#[from] serde_json::Error),
}

/// On-disk shape of the state file.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    car_ids: Vec<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Loads and rewrites the seen-set file. Each save fully replaces the
/// previous contents; ids dropped from a batch are forgotten.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted seen-set. A missing file is the normal first-run
    /// case and yields an empty set; an unreadable or malformed file is
    /// logged and also yields an empty set rather than failing the run.
    pub fn load(&self) -> SeenSet {
        if !self.path.exists() {
            info!("no state file at {}, treating all listings as new", self.path.display());
            return SeenSet::new();
        }

        match self.read_state() {
            Ok(state) => {
                info!(
                    "loaded {} previously seen listing id(s) (last updated: {})",
                    state.car_ids.len(),
                    state
                        .updated_at
                        .map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339()),
                );
                state.car_ids.into_iter().collect()
            }
            Err(err) => {
                warn!("could not load state file {}: {err}", self.path.display());
                SeenSet::new()
            }
        }
    }

    fn read_state(&self) -> Result<StateFile, StateError> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Replace the state file with the given id set. Written to a sibling
    /// temp file first and renamed into place so readers never observe a
    /// half-written file.
    pub fn save(&self, ids: &SeenSet) -> Result<(), StateError> {
        let mut car_ids: Vec<String> = ids.iter().cloned().collect();
        car_ids.sort();

        let state = StateFile {
            car_ids,
            updated_at: Some(Utc::now()),
        };

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(&state)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
