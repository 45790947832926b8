//! Device key-value store abstraction.
//!
//! DESIGN
//! ======
//! The application persists everything as JSON text blobs under a handful
//! of fixed string keys. `KvStore` is the narrow capability the rest of the
//! crate depends on: get / set / remove / remove-many by key. Values are
//! opaque strings at this layer; (de)serialization happens in the store
//! service above it.

pub mod file;
pub mod memory;

pub use file::FileKv;
pub use memory::MemoryKv;

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("io error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string-keyed blob store.
///
/// Implementations make no atomicity promise across keys. A `set` fully
/// replaces the previous value of its key.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Store `value` under `key`, overwriting anything already there.
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), KvError>;

    /// Remove every key in `keys`.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first failed removal.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), KvError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
