#![forbid(unsafe_code)]

//! Plumbing behind the `minidb` binary: CSV loading and the report types
//! printed by the `store` and `graph` commands.

/// Typed CSV loading into [`Record`](crate::model::Record)s.
pub mod import;
/// Building a record store and query facade from a CSV file.
pub mod store;
/// Building a bipartite graph from CSV tables.
pub mod graph;

pub use import::{parse_cell, read_records, CliError};
