use super::backend::StorageBackend;
use super::fs_backend::FsBackend;
use super::locks::LockRegistry;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::{
    next_numeric_id, validate_collection_name, validate_documents, CreateOptions, DocId, Document,
    IdKind, Placement,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CollectionStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    locks: LockRegistry,
    lock_timeout: Duration,
}

impl CollectionStore<FsBackend> {
    /// Filesystem-backed store rooted at `config.data_dir`.
    pub fn open(config: &StoreConfig) -> Self {
        Self::with_backend(FsBackend::new(&config.data_dir)).with_lock_timeout(config.lock_timeout())
    }
}

impl<B: StorageBackend> CollectionStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            locks: LockRegistry::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create the backing directory if needed. Idempotent.
    pub fn ensure_ready(&self) -> Result<()> {
        self.backend.ensure_ready()
    }

    /// Read a collection, bootstrapping it with `default` if it does not exist.
    ///
    /// The first bootstrap wins: once the file exists, later calls return the
    /// persisted content whatever default they pass.
    pub fn read(&self, name: &str, default: &[Document]) -> Result<Vec<Document>> {
        validate_collection_name(name)?;
        let lock = self.locks.handle(name);

        {
            let _shared = self.shared(&lock, name)?;
            if let Some(docs) = self.backend.load_collection(name)? {
                debug!(collection = name, count = docs.len(), "read collection");
                return Ok(docs);
            }
        }

        validate_documents(default).map_err(StoreError::Validation)?;
        let _exclusive = self.exclusive(&lock, name)?;
        let _file_lock = self.backend.lock_collection(name, self.lock_timeout)?;
        // Another caller, possibly in another process, may have bootstrapped
        // while we waited.
        if let Some(docs) = self.backend.load_collection(name)? {
            return Ok(docs);
        }

        self.backend.ensure_ready()?;
        self.backend.save_collection(name, default)?;
        info!(collection = name, count = default.len(), "bootstrapped collection with defaults");
        Ok(default.to_vec())
    }

    /// Read without bootstrap: an absent collection is empty and stays absent.
    pub fn list(&self, name: &str) -> Result<Vec<Document>> {
        Ok(self.snapshot(name)?.unwrap_or_default())
    }

    /// Read under the shared lock, distinguishing "absent" from "empty".
    pub fn snapshot(&self, name: &str) -> Result<Option<Vec<Document>>> {
        validate_collection_name(name)?;
        let lock = self.locks.handle(name);
        let _shared = self.shared(&lock, name)?;
        self.backend.load_collection(name)
    }

    /// Whether the collection has been created. A corrupt file still exists.
    pub fn exists(&self, name: &str) -> Result<bool> {
        validate_collection_name(name)?;
        self.backend.collection_exists(name)
    }

    pub fn get_by_id(&self, name: &str, id: &DocId) -> Result<Document> {
        self.list(name)?
            .into_iter()
            .find(|doc| doc.id().as_ref() == Some(id))
            .ok_or_else(|| not_found(name, id))
    }

    /// Insert a document according to the caller's collection policy.
    ///
    /// A supplied id must be unique. Without one, numeric collections get
    /// `max + 1` and text collections fail validation.
    pub fn create(&self, name: &str, mut doc: Document, options: CreateOptions) -> Result<Document> {
        self.modify(name, |docs| {
            match doc.raw_id() {
                Some(raw) => {
                    let id = DocId::from_value(raw).ok_or_else(|| {
                        StoreError::Validation("id must be a string or an integer".to_string())
                    })?;
                    if docs.iter().any(|d| d.id().as_ref() == Some(&id)) {
                        return Err(StoreError::Validation(format!(
                            "id {} already exists in collection '{}'",
                            id, name
                        )));
                    }
                }
                None => match options.id_kind {
                    IdKind::Numeric => {
                        let id = next_numeric_id(docs)?;
                        doc.set_id(&id);
                    }
                    IdKind::Text => {
                        return Err(StoreError::Validation(format!(
                            "collection '{}' requires a caller-supplied id",
                            name
                        )));
                    }
                },
            }

            match options.placement {
                Placement::Tail => docs.push(doc.clone()),
                Placement::Head => docs.insert(0, doc.clone()),
            }
            Ok(doc)
        })
    }

    /// Shallow-merge `partial` into the document with `id`. The id never changes.
    pub fn update(&self, name: &str, id: &DocId, partial: &Document) -> Result<Document> {
        self.modify(name, |docs| {
            let doc = docs
                .iter_mut()
                .find(|d| d.id().as_ref() == Some(id))
                .ok_or_else(|| not_found(name, id))?;
            doc.merge(partial);
            Ok(doc.clone())
        })
    }

    pub fn delete(&self, name: &str, id: &DocId) -> Result<Document> {
        self.modify(name, |docs| {
            let index = docs
                .iter()
                .position(|d| d.id().as_ref() == Some(id))
                .ok_or_else(|| not_found(name, id))?;
            Ok(docs.remove(index))
        })
    }

    /// Replace a collection wholesale.
    pub fn write(&self, name: &str, docs: &[Document]) -> Result<()> {
        validate_collection_name(name)?;
        validate_documents(docs).map_err(StoreError::Validation)?;
        let lock = self.locks.handle(name);
        let _exclusive = self.exclusive(&lock, name)?;
        let _file_lock = self.backend.lock_collection(name, self.lock_timeout)?;
        self.backend.ensure_ready()?;
        self.backend.save_collection(name, docs)?;
        debug!(collection = name, count = docs.len(), "wrote collection");
        Ok(())
    }

    /// Run a read-modify-write cycle while holding the collection's exclusive
    /// lock and the backend's cross-process lock.
    ///
    /// `f` sees the current content (empty if absent). If it returns an error
    /// nothing is written. The result must still pass id validation.
    pub fn modify<T, F>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Document>) -> Result<T>,
    {
        validate_collection_name(name)?;
        let lock = self.locks.handle(name);
        let _exclusive = self.exclusive(&lock, name)?;
        let _file_lock = self.backend.lock_collection(name, self.lock_timeout)?;

        let mut docs = self.backend.load_collection(name)?.unwrap_or_default();
        let out = f(&mut docs)?;
        validate_documents(&docs).map_err(StoreError::Validation)?;

        self.backend.ensure_ready()?;
        self.backend.save_collection(name, &docs)?;
        debug!(collection = name, count = docs.len(), "persisted collection");
        Ok(out)
    }

    pub fn collection_names(&self) -> Result<Vec<String>> {
        self.backend.collection_names()
    }

    fn shared<'a>(&self, lock: &'a RwLock<()>, name: &str) -> Result<RwLockReadGuard<'a, ()>> {
        lock.try_read_for(self.lock_timeout).ok_or_else(|| {
            StoreError::Conflict(format!(
                "timed out after {:?} waiting to read collection '{}'",
                self.lock_timeout, name
            ))
        })
    }

    fn exclusive<'a>(&self, lock: &'a RwLock<()>, name: &str) -> Result<RwLockWriteGuard<'a, ()>> {
        lock.try_write_for(self.lock_timeout).ok_or_else(|| {
            StoreError::Conflict(format!(
                "timed out after {:?} waiting to modify collection '{}'",
                self.lock_timeout, name
            ))
        })
    }
}

fn not_found(name: &str, id: &DocId) -> StoreError {
    StoreError::NotFound {
        collection: name.to_string(),
        id: id.clone(),
    }
}
