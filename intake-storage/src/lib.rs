//! Storage crate: the SQLite message log and the filesystem blob store.
//!
//! ## Modules
//!
//! - [`log_store`] – SqliteMessageLog (append, media-group probe, history)
//! - [`blob_store`] – FsBlobStore (keyed byte storage under a root dir)

mod blob_store;
mod log_store;

#[cfg(test)]
mod blob_store_test;

pub use blob_store::FsBlobStore;
pub use log_store::SqliteMessageLog;
