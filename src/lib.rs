//! Local-first event discovery.
//!
//! ARCHITECTURE
//! ============
//! `kv` abstracts the device key-value store, `services::storage` layers
//! JSON collections and relations on top of it, and the remaining services
//! implement signup, event authoring, discovery and engagement against that
//! store. There is no server: every operation is a local read-modify-write.

pub mod config;
pub mod kv;
pub mod models;
pub mod services;
pub mod util;

use std::sync::Arc;

use config::{AppConfig, BackendKind};
use kv::{FileKv, KvStore, MemoryKv};
use services::storage::LocalStore;

/// Open the store selected by `config`.
#[must_use]
pub fn open_store(config: &AppConfig) -> LocalStore {
    let kv: Arc<dyn KvStore> = match config.backend {
        BackendKind::File => Arc::new(FileKv::new(&config.data_dir)),
        BackendKind::Memory => Arc::new(MemoryKv::new()),
    };
    LocalStore::new(kv)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
