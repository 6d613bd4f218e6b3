//! Optional per-table field typing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DbError, Result};
use crate::model::{Record, ValueKind};

/// Declared scalar kinds for the fields of one table.
///
/// Fields not named in the schema are unchecked payload; declared fields
/// missing from a record are left to the store's indexed-attribute check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, ValueKind>,
}

impl Schema {
    /// Schema declaring nothing; every record passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` as holding values of `kind`.
    pub fn field(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Declared kind of `name`.
    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.fields.get(name).copied()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declared fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Checks every declared field present in `record`. The first
    /// mismatch is reported as [`DbError::TypeMismatch`].
    pub fn validate(&self, record: &Record) -> Result<()> {
        for (name, value) in record.iter() {
            if let Some(expected) = self.kind_of(name) {
                if !expected.accepts(value) {
                    return Err(DbError::TypeMismatch {
                        attribute: name.to_string(),
                        expected,
                        found: value.kind(),
                    });
                }
            }
        }
        Ok(())
    }
}
