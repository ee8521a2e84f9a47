use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::ITEM_COLUMNS;

/// One logging event: a number of hack actions and the items they yielded.
///
/// Serialized flat (`timestamp`, `hackCount`, then one key per item column)
/// to match the backing-file and CSV layouts. The timestamp doubles as the
/// record's identity when merging imported data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HackRecord {
    pub timestamp: String,
    #[serde(
        rename = "hackCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hack_count: Option<u32>,
    #[serde(flatten)]
    pub items: BTreeMap<String, u64>,
}

impl HackRecord {
    /// Build a record stamped with the current wall-clock time. Unknown item
    /// keys are dropped; known columns absent from `items` read as 0.
    pub fn new(hack_count: u32, items: &BTreeMap<String, u64>) -> Self {
        let items = ITEM_COLUMNS
            .iter()
            .filter_map(|col| items.get(*col).map(|v| (col.to_string(), *v)))
            .collect();
        Self {
            timestamp: now_timestamp(),
            hack_count: Some(hack_count),
            items,
        }
    }

    /// Hack actions this record represents; absent reads as 1.
    pub fn hack_count(&self) -> u32 {
        self.hack_count.unwrap_or(1)
    }

    /// Quantity for one item column; absent reads as 0.
    pub fn item(&self, column: &str) -> u64 {
        self.items.get(column).copied().unwrap_or(0)
    }

    /// Sum of all item quantities in this record.
    pub fn total_items(&self) -> u64 {
        ITEM_COLUMNS.iter().map(|col| self.item(col)).sum()
    }
}

/// Current local time in ISO-8601, used for record identity and therefore
/// kept at microsecond resolution.
pub fn now_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// The ordered record sequence, backed by a flat JSON file.
///
/// The store owns the sequence and the file; importers and the sync client
/// hand it new records through [`RecordStore::merge`]. The full sequence is
/// re-written on every mutation. Write failures are logged and swallowed so
/// the in-memory state stays usable.
pub struct RecordStore {
    path: PathBuf,
    records: Vec<HackRecord>,
}

impl RecordStore {
    /// Load the store from its backing file. A missing file, malformed JSON,
    /// or I/O error starts an empty sequence; never fatal.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("Ignoring malformed data file {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read data file {}: {}", path.display(), e);
                Vec::new()
            }
        };
        tracing::info!("Loaded {} records from {}", records.len(), path.display());
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[HackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one record and persist. Timestamp collisions are not checked
    /// here; sub-second wall-clock timestamps make them a non-issue for
    /// direct adds, and merges dedup explicitly.
    pub fn append(&mut self, record: HackRecord) {
        self.records.push(record);
        self.persist();
    }

    /// Merge records whose timestamps are not already present, persist, and
    /// return how many were inserted. Already-seen timestamps are silently
    /// dropped.
    pub fn merge(&mut self, incoming: Vec<HackRecord>) -> usize {
        let mut seen: HashSet<String> = self
            .records
            .iter()
            .map(|r| r.timestamp.clone())
            .collect();

        let mut inserted = 0;
        for record in incoming {
            if seen.insert(record.timestamp.clone()) {
                self.records.push(record);
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.persist();
        }
        inserted
    }

    /// Empty the sequence and persist. Confirmation is the caller's concern.
    pub fn clear(&mut self) {
        self.records.clear();
        self.persist();
    }

    fn persist(&self) {
        let json = match serde_json::to_string_pretty(&self.records) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize records: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!("Failed to persist records to {}: {}", self.path.display(), e);
        }
    }
}
