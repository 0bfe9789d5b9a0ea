use super::file_lock::CollectionGuard;
use crate::error::Result;
use crate::model::Document;
use std::path::PathBuf;
use std::time::Duration;

/// Abstract interface for raw collection I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while `CollectionStore` handles the "what" (locking, ids, merge semantics).
///
/// Implementations are shared between request handlers, hence `Send + Sync`.
pub trait StorageBackend: Send + Sync {
    /// Make the backing location exist. Idempotent.
    fn ensure_ready(&self) -> Result<()>;

    /// Load a collection.
    /// Returns Ok(None) if the collection does not exist yet.
    /// Returns `CorruptData` if it exists but is not a well-formed document array,
    /// and `Io` only on actual I/O errors (permissions, disk failure).
    fn load_collection(&self, name: &str) -> Result<Option<Vec<Document>>>;

    /// Replace a collection wholesale.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn save_collection(&self, name: &str, docs: &[Document]) -> Result<()>;

    /// Whether the collection exists, well-formed or not.
    fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Where the collection lives. For MemBackend, a virtual path.
    fn collection_path(&self, name: &str) -> PathBuf;

    /// Serialize read-modify-write cycles on `name` across processes.
    /// Held from the load through the save; waits at most `timeout`.
    fn lock_collection(&self, name: &str, timeout: Duration) -> Result<CollectionGuard>;

    /// Names of all existing collections, sorted.
    fn collection_names(&self) -> Result<Vec<String>>;
}
