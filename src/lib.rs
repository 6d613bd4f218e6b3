//! MiniDB: an in-memory record store with balanced secondary indexes, a
//! key-addressed query facade, and an undirected graph model with
//! traversal algorithms.
//!
//! ```
//! use minidb::{QueryEngine, Record, RecordStore, StoreConfig, Value};
//!
//! let store = RecordStore::new(StoreConfig::new(["appid", "price"])).unwrap();
//! let mut engine = QueryEngine::new(store, "appid").unwrap();
//! engine
//!     .insert_record(Record::new().with("appid", 1).with("price", 9.99))
//!     .unwrap();
//! let hits = engine
//!     .range_query("price", &Value::Int(5), &Value::Int(10))
//!     .unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod db;
pub mod error;
pub mod graph;
pub mod index;
pub mod logging;
pub mod model;
pub mod query;
pub mod schema;

pub use db::{RecordStore, StoreConfig, StoreMetrics};
pub use error::{DbError, Result};
pub use graph::{
    BipartiteBuilder, BipartiteGraph, BipartiteSide, Edge, EdgeData, EdgeId, Graph, Vertex,
    VertexId,
};
pub use index::AvlIndex;
pub use logging::init_logging;
pub use model::{Record, SlotId, Value, ValueKind};
pub use query::{KeyPolicy, QueryEngine};
pub use schema::Schema;
