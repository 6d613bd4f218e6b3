//! The record store: slot storage, per-attribute indexes and their
//! configuration.

mod config;
mod metrics;
mod store;


pub use config::StoreConfig;
pub use metrics::StoreMetrics;
pub use store::RecordStore;
