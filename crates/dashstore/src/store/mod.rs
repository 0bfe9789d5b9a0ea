//! # Storage Layer
//!
//! A collection is a named JSON array persisted as a single file. This module owns
//! everything between a caller asking for "collection X" and bytes on disk.
//!
//! ## Layers
//!
//! 1. [`backend::StorageBackend`]: raw load/save of one collection. Knows nothing
//!    about ids or locking.
//! 2. [`collection_store::CollectionStore`]: CRUD semantics, id assignment,
//!    bootstrap, and per-collection serialization.
//!
//! ## Consistency
//!
//! - **Atomic publish**: every save writes a temp file in the data directory and
//!   renames it over the target. Readers see the old file or the new one, never a
//!   prefix.
//! - **Serialized read-modify-write**: each collection name has its own
//!   reader/writer lock. `create`, `update`, `delete`, `write` and `modify` hold it
//!   exclusively from the load through the save, so N concurrent mutations end up
//!   equivalent to some sequential order of them. Reads hold it shared.
//!   Collections never wait on each other.
//! - **Across processes**: [`FsBackend`] also takes an exclusive advisory lock
//!   on `.<name>.lock` (via `fs2`) for the same span, so separate processes
//!   sharing a data directory serialize their mutations too.
//! - **Bounded waits**: lock acquisition gives up after the configured timeout
//!   with `StoreError::Conflict`; nothing is written in that case.
//! - **Absent vs corrupt**: a missing file is an empty (or bootstrapped)
//!   collection. A file that does not parse is `CorruptData` and is left alone.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: production, one file per collection.
//! - [`mem_backend::MemBackend`]: for testing logic without filesystem I/O, with
//!   failure injection.
//!
//! ## Storage Layout
//!
//! ```text
//! data/
//! ├── .notifications.lock      # advisory lock, created on first mutation
//! ├── dashboard-stats.json
//! ├── notifications.json
//! └── rebels-ranking.json
//! ```

pub mod atomic;
pub mod backend;
pub mod codec;
pub mod collection_store;
pub mod file_lock;
pub mod fs_backend;
mod locks;
pub mod mem_backend;

pub use backend::StorageBackend;
pub use collection_store::CollectionStore;
pub use file_lock::CollectionGuard;
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
