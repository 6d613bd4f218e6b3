use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::import::{read_records, CliError};
use crate::db::{RecordStore, StoreConfig, StoreMetrics};
use crate::model::{Record, SlotId, Value};
use crate::query::{KeyPolicy, QueryEngine};

/// Settings for loading one CSV table into a [`QueryEngine`].
#[derive(Debug, Clone)]
pub struct StoreLoadConfig {
    /// CSV file with one record per row.
    pub path: PathBuf,
    /// Columns to index. The key column is indexed even if not listed.
    pub indexed: Vec<String>,
    /// Column addressed by search, delete and update.
    pub key: String,
    /// Hand freed slot ids back out on insert.
    pub reuse_free_slots: bool,
    /// Refuse repeated key values.
    pub strict: bool,
}

/// Loads the CSV table described by `cfg` into a fresh store and facade.
pub fn load_engine(cfg: &StoreLoadConfig) -> Result<QueryEngine, CliError> {
    let mut attributes = cfg.indexed.clone();
    if !attributes.contains(&cfg.key) {
        attributes.push(cfg.key.clone());
    }
    let required: Vec<&str> = attributes.iter().map(String::as_str).collect();
    let records = read_records(&cfg.path, &required)?;

    let store = RecordStore::new(
        StoreConfig::new(attributes.iter().cloned()).reuse_free_slots(cfg.reuse_free_slots),
    )?;
    let policy = if cfg.strict {
        KeyPolicy::StrictUnique
    } else {
        KeyPolicy::MultiMatch
    };
    let mut engine = QueryEngine::with_policy(store, cfg.key.clone(), policy)?;
    for record in records {
        engine.insert_record(record)?;
    }
    info!(
        path = %cfg.path.display(),
        records = engine.store().len(),
        indexes = attributes.len(),
        "store loaded"
    );
    Ok(engine)
}

/// An active record with its slot id.
#[derive(Debug, Clone, Serialize)]
pub struct SlotRecord {
    /// Slot holding the record.
    pub slot: SlotId,
    /// The record.
    pub record: Record,
}

/// Answer to a search or range command.
#[derive(Debug, Clone, Serialize)]
pub struct RecordsReport {
    /// Number of records returned.
    pub matched: usize,
    /// The records, in the order the store produced them.
    pub records: Vec<SlotRecord>,
}

impl RecordsReport {
    /// Resolves `slots` against `store`, dropping tombstones.
    pub fn collect(store: &RecordStore, slots: &[SlotId]) -> Self {
        let records: Vec<SlotRecord> = slots
            .iter()
            .filter_map(|&slot| {
                store.get_record(slot).map(|record| SlotRecord {
                    slot,
                    record: record.clone(),
                })
            })
            .collect();
        Self {
            matched: records.len(),
            records,
        }
    }
}

/// Outcome of a delete-by-key.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    /// Key that was deleted.
    pub key: Value,
    /// Whether any record matched.
    pub deleted: bool,
    /// Active records left afterwards.
    pub remaining: usize,
}

/// Shape of one index tree.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    /// Indexed attribute.
    pub attribute: String,
    /// Distinct keys.
    pub keys: usize,
    /// Stored slot ids.
    pub entries: usize,
    /// Tree height.
    pub height: u32,
}

/// Result of checking every index against the slots, with store statistics.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    /// True when every check passed.
    pub success: bool,
    /// First violation found, if any.
    pub error: Option<String>,
    /// Active records.
    pub records: usize,
    /// Allocated slots, tombstones included.
    pub slots: usize,
    /// Ids waiting on the free list.
    pub free_slots: usize,
    /// One entry per indexed attribute.
    pub indexes: Vec<IndexSummary>,
    /// Counter snapshot.
    pub metrics: StoreMetrics,
}

impl VerifyReport {
    /// Runs the checks and gathers the statistics.
    pub fn build(store: &RecordStore) -> Self {
        let error = store.verify_indexes().err().map(|err| err.to_string());
        let indexes = store
            .indexed_attributes()
            .iter()
            .filter_map(|attribute| {
                let index = store.index(attribute).ok()?;
                Some(IndexSummary {
                    attribute: attribute.clone(),
                    keys: index.len(),
                    entries: index.entry_count(),
                    height: index.height(),
                })
            })
            .collect();
        Self {
            success: error.is_none(),
            error,
            records: store.len(),
            slots: store.slot_count(),
            free_slots: store.free_slot_count(),
            indexes,
            metrics: store.metrics(),
        }
    }
}
