use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::RecordStore;
use crate::error::{DbError, Result};
use crate::model::{Record, SlotId, Value};

/// How the facade treats several records sharing one key value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Key values may repeat; update and delete act on every match.
    #[default]
    MultiMatch,
    /// Key values are unique; inserts and key changes that would collide
    /// fail with [`DbError::DuplicateKey`].
    StrictUnique,
}

/// CRUD verbs addressed by the value of one indexed key attribute.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: RecordStore,
    key_attribute: String,
    policy: KeyPolicy,
}

impl QueryEngine {
    /// Facade over `store` keyed by `key_attribute`, with the default
    /// [`KeyPolicy::MultiMatch`].
    pub fn new(store: RecordStore, key_attribute: impl Into<String>) -> Result<Self> {
        Self::with_policy(store, key_attribute, KeyPolicy::default())
    }

    /// Like [`QueryEngine::new`] with an explicit policy. The key must be
    /// indexed, and under [`KeyPolicy::StrictUnique`] the store must not
    /// already hold repeated keys.
    pub fn with_policy(
        store: RecordStore,
        key_attribute: impl Into<String>,
        policy: KeyPolicy,
    ) -> Result<Self> {
        let key_attribute = key_attribute.into();
        let index = store.index(&key_attribute).map_err(|_| {
            DbError::Configuration(format!(
                "key attribute '{key_attribute}' is not an indexed attribute of the store"
            ))
        })?;
        if policy == KeyPolicy::StrictUnique {
            if let Some((value, _)) = index.iter().find(|(_, bucket)| bucket.len() > 1) {
                return Err(DbError::Configuration(format!(
                    "store already holds several records with {key_attribute} = {value}"
                )));
            }
        }
        Ok(Self {
            store,
            key_attribute,
            policy,
        })
    }

    /// Active records whose key equals `key`.
    pub fn search_record(&self, key: &Value) -> Result<Vec<&Record>> {
        self.store.search_by_attr(&self.key_attribute, key)
    }

    /// Inserts `record` and returns its slot id.
    pub fn insert_record(&mut self, record: Record) -> Result<SlotId> {
        if self.policy == KeyPolicy::StrictUnique {
            if let Some(key) = record.get(&self.key_attribute) {
                self.ensure_unused(key)?;
            }
        }
        self.store.insert_record(record)
    }

    /// Sets `field` to `value` on every record matching `key`, keeping each
    /// record's slot id. Returns false if nothing matched.
    pub fn update_record(&mut self, key: &Value, field: &str, value: Value) -> Result<bool> {
        let ids = self.store.find_slots(&self.key_attribute, key)?;
        if ids.is_empty() {
            return Ok(false);
        }
        if self.policy == KeyPolicy::StrictUnique && field == self.key_attribute && value != *key {
            self.ensure_unused(&value)?;
        }

        for &id in &ids {
            let mut record = self
                .store
                .get_record(id)
                .cloned()
                .ok_or(DbError::InvalidSlot(id))?;
            record.set(field, value.clone());
            self.store.update_record(id, record)?;
        }
        debug!(key = %key, field, matched = ids.len(), "records updated by key");
        Ok(true)
    }

    /// Deletes every record matching `key`. Returns false if nothing matched.
    pub fn delete_record(&mut self, key: &Value) -> Result<bool> {
        let ids = self.store.find_slots(&self.key_attribute, key)?;
        let mut deleted = false;
        for id in ids {
            deleted |= self.store.delete_record(id);
        }
        Ok(deleted)
    }

    /// Range scan over any indexed attribute.
    pub fn range_query(&self, attribute: &str, low: &Value, high: &Value) -> Result<Vec<&Record>> {
        self.store.range_query(attribute, low, high)
    }

    /// Direct slot access.
    pub fn get_record(&self, id: SlotId) -> Option<&Record> {
        self.store.get_record(id)
    }

    /// Attribute the facade is keyed by.
    pub fn key_attribute(&self) -> &str {
        &self.key_attribute
    }

    /// Active key policy.
    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// The underlying store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Gives the store back.
    pub fn into_store(self) -> RecordStore {
        self.store
    }

    fn ensure_unused(&self, key: &Value) -> Result<()> {
        if self.store.index(&self.key_attribute)?.contains_key(key) {
            return Err(DbError::DuplicateKey {
                attribute: self.key_attribute.clone(),
                value: key.to_string(),
            });
        }
        Ok(())
    }
}
