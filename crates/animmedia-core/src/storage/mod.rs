//! Local storage abstraction.
//!
//! `LocalStorage` mirrors the browser's synchronous string key/value store.
//! `SmartCache`, `Analytics` and `CookieConsent` all sit on top of it, each
//! owning its own key namespace.
//!
//! Two implementations are provided:
//! - `MemoryStorage`: process-local, with an optional byte quota
//! - `FileStorage`: a JSON document on disk, written through on every change

pub mod error;
pub mod file;
pub mod memory;

pub use error::StorageError;
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Synchronous string key/value store.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Bytes a key/value pair counts against a quota.
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
