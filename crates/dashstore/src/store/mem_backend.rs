use super::backend::StorageBackend;
use super::codec::{decode_collection, encode_collection};
use super::file_lock::CollectionGuard;
use crate::error::{Result, StoreError};
use crate::model::Document;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// In-memory storage backend for testing.
///
/// Collections are kept as serialized JSON text so the same decode path (and
/// the same corruption handling) runs as for files on disk.
#[derive(Default)]
pub struct MemBackend {
    collections: Mutex<BTreeMap<String, String>>,
    simulate_write_error: Mutex<bool>,
    failing_collections: Mutex<HashSet<String>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for every collection.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.lock() = simulate;
    }

    /// Make writes to a single collection fail.
    pub fn fail_writes_for(&self, name: &str) {
        self.failing_collections.lock().insert(name.to_string());
    }

    /// Test helper to plant arbitrary (possibly corrupt) content.
    pub fn put_raw(&self, name: &str, text: &str) {
        self.collections
            .lock()
            .insert(name.to_string(), text.to_string());
    }

    pub fn raw(&self, name: &str) -> Option<String> {
        self.collections.lock().get(name).cloned()
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        if *self.simulate_write_error.lock() || self.failing_collections.lock().contains(name) {
            return Err(StoreError::Io(std::io::Error::other(format!(
                "simulated write error for '{}'",
                name
            ))));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    fn load_collection(&self, name: &str) -> Result<Option<Vec<Document>>> {
        let text = self.collections.lock().get(name).cloned();
        match text {
            Some(text) => decode_collection(&text, &self.collection_path(name)).map(Some),
            None => Ok(None),
        }
    }

    fn save_collection(&self, name: &str, docs: &[Document]) -> Result<()> {
        self.check_writable(name)?;
        let bytes = encode_collection(docs)?;
        let text = String::from_utf8(bytes).map_err(|e| StoreError::Io(std::io::Error::other(e)))?;
        self.collections.lock().insert(name.to_string(), text);
        Ok(())
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.lock().contains_key(name))
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("memory://{}.json", name))
    }

    fn lock_collection(&self, _name: &str, _timeout: Duration) -> Result<CollectionGuard> {
        Ok(CollectionGuard::unlocked())
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        Ok(self.collections.lock().keys().cloned().collect())
    }
}
