use crate::error::{DbError, Result};
use crate::schema::Schema;

/// Construction options for a [`RecordStore`](super::RecordStore).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Attributes that get their own index tree. Every record must carry them.
    pub indexed_attributes: Vec<String>,
    /// Hand freed slot ids back out (oldest first) instead of always appending.
    pub reuse_free_slots: bool,
    /// Optional field kinds checked once per insert/update.
    pub schema: Option<Schema>,
}

impl StoreConfig {
    /// Append-only config indexing `indexed_attributes`, with no schema.
    pub fn new<I, S>(indexed_attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indexed_attributes: indexed_attributes.into_iter().map(Into::into).collect(),
            reuse_free_slots: false,
            schema: None,
        }
    }

    /// Slot ids only ever grow; a deleted id is never handed out again.
    pub fn append_only<I, S>(indexed_attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(indexed_attributes)
    }

    /// Freed slots are recycled in FIFO order so storage stays dense.
    pub fn compact<I, S>(indexed_attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(indexed_attributes).reuse_free_slots(true)
    }

    /// Turns slot recycling on or off.
    pub fn reuse_free_slots(mut self, enabled: bool) -> Self {
        self.reuse_free_slots = enabled;
        self
    }

    /// Checks every insert and update against `schema`.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Returns the indexed attributes with duplicates collapsed, first
    /// occurrence wins.
    pub(crate) fn normalized_attributes(&self) -> Result<Vec<String>> {
        let mut attributes: Vec<String> = Vec::with_capacity(self.indexed_attributes.len());
        for attribute in &self.indexed_attributes {
            if attribute.trim().is_empty() {
                return Err(DbError::Configuration(
                    "indexed attribute names must not be empty".into(),
                ));
            }
            if !attributes.contains(attribute) {
                attributes.push(attribute.clone());
            }
        }
        if attributes.is_empty() {
            return Err(DbError::Configuration(
                "at least one indexed attribute is required".into(),
            ));
        }
        Ok(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_set_reuse_policy() {
        assert!(!StoreConfig::append_only(["appid"]).reuse_free_slots);
        assert!(StoreConfig::compact(["appid"]).reuse_free_slots);
    }

    #[test]
    fn duplicates_collapse_and_empty_is_rejected() {
        let config = StoreConfig::new(["appid", "price", "appid"]);
        assert_eq!(
            config.normalized_attributes().unwrap(),
            vec!["appid".to_string(), "price".to_string()]
        );
        assert!(matches!(
            StoreConfig::new(Vec::<String>::new()).normalized_attributes(),
            Err(DbError::Configuration(_))
        ));
        assert!(matches!(
            StoreConfig::new([" "]).normalized_attributes(),
            Err(DbError::Configuration(_))
        ));
    }
}
