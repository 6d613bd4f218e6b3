use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::config::StoreConfig;
use super::metrics::{Counters, StoreMetrics};
use crate::error::{DbError, Result};
use crate::index::AvlIndex;
use crate::model::{Record, SlotId, Value};
use crate::schema::Schema;

/// Slot array of records with one AVL index per configured attribute.
///
/// Slots are tombstoned (`None`) on delete. With slot reuse enabled, freed
/// ids are handed back out oldest-first; otherwise ids only grow.
#[derive(Debug, Clone)]
pub struct RecordStore {
    attributes: Vec<String>,
    indexes: FxHashMap<String, AvlIndex<Value>>,
    slots: Vec<Option<Record>>,
    free_slots: VecDeque<SlotId>,
    reuse_free_slots: bool,
    schema: Option<Schema>,
    active: usize,
    counters: Counters,
}

impl RecordStore {
    /// Empty store. Fails with [`DbError::Configuration`] when the config
    /// names no usable attribute.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let attributes = config.normalized_attributes()?;
        let indexes = attributes
            .iter()
            .map(|attribute| (attribute.clone(), AvlIndex::new()))
            .collect();
        Ok(Self {
            attributes,
            indexes,
            slots: Vec::new(),
            free_slots: VecDeque::new(),
            reuse_free_slots: config.reuse_free_slots,
            schema: config.schema,
            active: 0,
            counters: Counters::default(),
        })
    }

    /// Indexes `record` under every configured attribute and returns its
    /// slot id. Nothing is mutated if validation fails.
    pub fn insert_record(&mut self, record: Record) -> Result<SlotId> {
        self.check_record(&record)?;

        let reused = if self.reuse_free_slots {
            self.free_slots.pop_front()
        } else {
            None
        };
        let id = match reused {
            Some(id) => {
                self.slots[id] = Some(record);
                id
            }
            None => {
                self.slots.push(Some(record));
                self.slots.len() - 1
            }
        };

        self.index_slot(id);
        self.active += 1;
        self.counters.record_insert(reused.is_some());
        debug!(slot = id, reused = reused.is_some(), "record inserted");
        Ok(id)
    }

    /// Inserts records in order, stopping at the first failure.
    pub fn insert_many<I>(&mut self, records: I) -> Result<Vec<SlotId>>
    where
        I: IntoIterator<Item = Record>,
    {
        records
            .into_iter()
            .map(|record| self.insert_record(record))
            .collect()
    }

    /// Active records whose `attribute` equals `key`.
    pub fn search_by_attr(&self, attribute: &str, key: &Value) -> Result<Vec<&Record>> {
        let ids = self.find_slots(attribute, key)?;
        Ok(ids.into_iter().filter_map(|id| self.get_record(id)).collect())
    }

    /// Slot ids of active records whose `attribute` equals `key`.
    pub fn find_slots(&self, attribute: &str, key: &Value) -> Result<Vec<SlotId>> {
        let index = self.index(attribute)?;
        self.counters.record_lookup();
        Ok(self.live_ids(index.search(key)))
    }

    /// Active records with `low <= record[attribute] <= high`, in ascending
    /// attribute order.
    pub fn range_query(&self, attribute: &str, low: &Value, high: &Value) -> Result<Vec<&Record>> {
        let ids = self.range_slots(attribute, low, high)?;
        Ok(ids.into_iter().filter_map(|id| self.get_record(id)).collect())
    }

    /// Slots whose `attribute` lies in `low..=high`, ascending by value.
    pub fn range_slots(&self, attribute: &str, low: &Value, high: &Value) -> Result<Vec<SlotId>> {
        let index = self.index(attribute)?;
        if low > high {
            return Err(DbError::InvalidRange {
                attribute: attribute.to_string(),
                low: low.to_string(),
                high: high.to_string(),
            });
        }
        self.counters.record_range_scan();
        Ok(self.live_ids(&index.range(low, high)))
    }

    /// Tombstones slot `id` and drops it from every index. Returns false if
    /// the slot is out of range or already empty.
    pub fn delete_record(&mut self, id: SlotId) -> bool {
        let Some(record) = self.slots.get_mut(id).and_then(Option::take) else {
            return false;
        };
        self.unindex_record(id, &record);
        self.active -= 1;
        if self.reuse_free_slots {
            self.free_slots.push_back(id);
        }
        self.counters.record_delete();
        debug!(slot = id, "record deleted");
        true
    }

    /// Replaces the content of slot `id` in place and re-indexes it under
    /// the same id. The free-slot queue is never touched.
    pub fn update_record(&mut self, id: SlotId, record: Record) -> Result<()> {
        self.check_record(&record)?;
        let slot = match self.slots.get_mut(id) {
            Some(slot) if slot.is_some() => slot,
            _ => return Err(DbError::InvalidSlot(id)),
        };
        if let Some(old) = slot.replace(record) {
            self.unindex_record(id, &old);
        }
        self.index_slot(id);
        self.counters.record_update();
        debug!(slot = id, "record updated");
        Ok(())
    }

    /// The record in slot `id`; `None` for tombstones and unknown ids.
    pub fn get_record(&self, id: SlotId) -> Option<&Record> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// The index tree for `attribute`.
    pub fn index(&self, attribute: &str) -> Result<&AvlIndex<Value>> {
        self.indexes
            .get(attribute)
            .ok_or_else(|| DbError::UnindexedAttribute(attribute.to_string()))
    }

    /// Whether `attribute` has an index.
    pub fn is_indexed(&self, attribute: &str) -> bool {
        self.indexes.contains_key(attribute)
    }

    /// Indexed attributes in configuration order.
    pub fn indexed_attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Field kinds enforced on insert and update, if any.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Whether freed ids are recycled.
    pub fn reuses_free_slots(&self) -> bool {
        self.reuse_free_slots
    }

    /// Number of active records.
    pub fn len(&self) -> usize {
        self.active
    }

    /// True when no record is active.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Number of slots ever allocated, tombstones included.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Freed ids waiting to be reused. Always zero without slot reuse.
    pub fn free_slot_count(&self) -> usize {
        self.free_slots.len()
    }

    /// Active slots in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &Record)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|record| (id, record)))
    }

    /// Counters accumulated since creation or the last reset.
    pub fn metrics(&self) -> StoreMetrics {
        self.counters.snapshot()
    }

    /// Zeroes every counter.
    pub fn reset_metrics(&mut self) {
        self.counters.reset();
    }

    /// Checks every tree's invariants and that trees and slots agree: each
    /// active slot sits in the bucket of its value, and nothing else does.
    pub fn verify_indexes(&self) -> Result<()> {
        for attribute in &self.attributes {
            let index = self.index(attribute)?;
            index.verify()?;
            if index.entry_count() != self.active {
                return Err(DbError::InvariantViolation(format!(
                    "index '{attribute}' holds {} ids for {} active records",
                    index.entry_count(),
                    self.active
                )));
            }
            for (id, record) in self.iter() {
                let value = record
                    .get(attribute)
                    .ok_or_else(|| DbError::MissingAttribute(attribute.clone()))?;
                if !index.search(value).contains(&id) {
                    return Err(DbError::InvariantViolation(format!(
                        "slot {id} missing from index '{attribute}' under {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_record(&self, record: &Record) -> Result<()> {
        if let Some(missing) = self.attributes.iter().find(|attr| !record.contains(attr)) {
            return Err(DbError::MissingAttribute(missing.clone()));
        }
        if let Some(schema) = &self.schema {
            schema.validate(record)?;
        }
        Ok(())
    }

    fn index_slot(&mut self, id: SlotId) {
        let Some(record) = self.slots.get(id).and_then(Option::as_ref) else {
            return;
        };
        for attribute in &self.attributes {
            if let (Some(value), Some(index)) = (record.get(attribute), self.indexes.get_mut(attribute)) {
                index.insert(value.clone(), id);
            }
        }
    }

    fn unindex_record(&mut self, id: SlotId, record: &Record) {
        for attribute in &self.attributes {
            if let (Some(value), Some(index)) = (record.get(attribute), self.indexes.get_mut(attribute)) {
                if !index.delete(value, id) {
                    warn!(slot = id, attribute = %attribute, "slot was not present in index");
                }
            }
        }
    }

    fn live_ids(&self, ids: &[SlotId]) -> Vec<SlotId> {
        let live: Vec<SlotId> = ids
            .iter()
            .copied()
            .filter(|&id| self.get_record(id).is_some())
            .collect();
        let skipped = ids.len() - live.len();
        if skipped > 0 {
            self.counters.record_tombstones_skipped(skipped as u64);
        }
        live
    }
}
