#![forbid(unsafe_code)]

//! Key-addressed CRUD over a [`RecordStore`](crate::RecordStore).
//!
//! Callers outside the store address records by the value of one designated
//! key attribute instead of by slot id.

/// Query facade bound to a key attribute.
pub mod engine;

pub use engine::{KeyPolicy, QueryEngine};
