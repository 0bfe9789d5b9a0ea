//! # dashstore
//!
//! A file-backed document store for the dashboard: named collections of JSON
//! documents with CRUD by `id`, plus point-in-time backups.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Request handlers / CLI (outside this crate's concerns)  │
//! └──────────────────────────────────────────────────────────┘
//!            │                               │
//!            ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  CollectionStore         │◀──│  BackupManager           │
//! │  (store/)                │   │  (backup/)               │
//! │  locking, ids, merge     │   │  snapshot + restore      │
//! └──────────────────────────┘   └──────────────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────────┐
//! │  StorageBackend          │
//! │  FsBackend / MemBackend  │
//! └──────────────────────────┘
//! ```
//!
//! - [`store`]: the collection store and its backends.
//! - [`backup`]: archives and the backup manager.
//! - [`catalog`]: the dashboard's collections, their write policies and defaults.
//! - [`model`]: documents, ids, create policies.
//! - [`config`]: layered configuration.
//! - [`error`]: the failure taxonomy every operation returns.
//!
//! Every operation returns a typed [`error::StoreError`]; [`error::ErrorKind`]
//! is what a transport layer should switch on. The store never retries and never
//! turns a failure into an empty collection.

pub mod backup;
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use backup::{ArchiveId, BackupManager, BackupReport, RestoreReport};
pub use config::StoreConfig;
pub use error::{ErrorKind, Result, StoreError};
pub use model::{CreateOptions, DocId, Document, IdKind, Placement};
pub use store::{CollectionStore, FsBackend, MemBackend, StorageBackend};
