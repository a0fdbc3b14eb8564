//! `records.json` round-trip for a [`LeaderboardStore`].

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::StorageError;
use crate::leaderboard::LeaderboardStore;
use crate::models::{PlayerId, PlayerRecord};

/// File name of the persisted history inside the data directory.
pub const RECORDS_FILE: &str = "records.json";

/// On-disk document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecordsFile {
    #[serde(default)]
    pub players: BTreeMap<PlayerId, PlayerEntry>,
}

/// One player's persisted records.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// Informational; recomputed from the records on load.
    #[serde(default)]
    pub current_name: Option<String>,

    #[serde(default)]
    pub records: Vec<PlayerRecord>,
}

impl RecordsFile {
    /// Snapshot every player's records.
    pub fn from_store(store: &LeaderboardStore) -> Self {
        let players = store
            .histories()
            .map(|history| {
                (
                    history.id.clone(),
                    PlayerEntry {
                        current_name: Some(history.latest_record().observed_name.clone()),
                        records: history.records().to_vec(),
                    },
                )
            })
            .collect();
        Self { players }
    }

    /// Rebuild a store; records sharing a timestamp collapse to the first.
    pub fn into_store(self, mut store: LeaderboardStore) -> LeaderboardStore {
        for (_, entry) in self.players {
            for record in entry.records {
                store.add_record(record);
            }
        }
        store
    }
}

/// Load persisted history into `store`.
///
/// A missing file yields the empty store. A corrupt file is logged and also
/// yields the empty store; only IO failures are reported.
pub fn load_store(path: &Path, store: LeaderboardStore) -> Result<LeaderboardStore, StorageError> {
    if !path.exists() {
        debug!("No records file at {:?}, starting empty", path);
        return Ok(store);
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    match serde_json::from_reader::<_, RecordsFile>(reader) {
        Ok(records) => {
            let store = records.into_store(store);
            info!(
                "Loaded {} players ({} records) from {:?}",
                store.len(),
                store.record_count(),
                path
            );
            Ok(store)
        }
        Err(e) => {
            warn!("Error loading {:?}: {}. Using empty leaderboard.", path, e);
            Ok(store)
        }
    }
}

/// Write the store's records, replacing any previous file.
pub fn save_store(path: &Path, store: &LeaderboardStore) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &RecordsFile::from_store(store))?;
    writer.flush()?;

    info!("Saved {} players to {:?}", store.len(), path);
    Ok(())
}
