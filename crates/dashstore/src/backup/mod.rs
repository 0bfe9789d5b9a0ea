//! # Backups
//!
//! [`BackupManager`] snapshots a set of collections into one timestamped JSON
//! archive and replays archives back into the live store.
//!
//! ## Archive Format
//!
//! ```text
//! {
//!   "timestamp": "2026-10-19T08:30:00.123456Z",
//!   "data": {
//!     "rebels-ranking": [ {...}, ... ],
//!     "notifications": null
//!   },
//!   "errors": { "notifications": "collection does not exist" }
//! }
//! ```
//!
//! Archives are written atomically into the backup directory as
//! `backup-<capture time>.json` and never modified afterwards.
//!
//! ## Capture
//!
//! Each collection is read under its own shared lock, one after the other.
//! A backup is therefore NOT a cross-collection transaction: a writer touching
//! collection B between the reads of A and B makes the archive reflect two
//! different instants. Collections that cannot be read are recorded as `null`
//! and reported in [`BackupReport::absent`] instead of aborting the backup.
//!
//! ## Restore
//!
//! The whole archive is validated before the first write. Each collection is
//! then replaced wholesale. Restores are not atomic across collections: if a
//! write fails, earlier collections stay restored, the failing one is left as it
//! was, and the rest are not attempted. [`RestoreReport`] names each group.

pub mod archive;

pub use archive::{Archive, ArchiveId};

use crate::error::{Result, StoreError};
use crate::model::validate_collection_name;
use crate::store::atomic::write_atomic;
use crate::store::{CollectionStore, StorageBackend};
use archive::{ARCHIVE_EXT, ARCHIVE_PREFIX};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const ABSENT_REASON: &str = "collection does not exist";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsentCollection {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub archive_id: ArchiveId,
    pub path: PathBuf,
    pub captured_at: DateTime<Utc>,
    pub captured: Vec<String>,
    pub absent: Vec<AbsentCollection>,
}

impl BackupReport {
    pub fn is_complete(&self) -> bool {
        self.absent.is_empty()
    }
}

#[derive(Debug)]
pub struct RestoreFailure {
    pub collection: String,
    pub error: StoreError,
}

#[derive(Debug)]
pub struct RestoreReport {
    pub archive_id: ArchiveId,
    pub captured_at: DateTime<Utc>,
    pub restored: Vec<String>,
    /// Collections recorded as `null` in the archive.
    pub skipped: Vec<String>,
    pub failed: Option<RestoreFailure>,
    /// Not attempted because an earlier collection failed.
    pub pending: Vec<String>,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

pub struct BackupManager<B: StorageBackend> {
    store: Arc<CollectionStore<B>>,
    backup_dir: PathBuf,
    // Serializes archive naming so two captures in the same microsecond
    // cannot pick the same file.
    naming: Mutex<()>,
}

impl<B: StorageBackend> BackupManager<B> {
    pub fn new(store: Arc<CollectionStore<B>>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            backup_dir: backup_dir.into(),
            naming: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<CollectionStore<B>> {
        &self.store
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn archive_path(&self, id: &ArchiveId) -> PathBuf {
        self.backup_dir.join(id.file_name())
    }

    /// Capture `names` into a new archive.
    ///
    /// Unreadable collections are recorded as absent. Only failing to write
    /// the archive itself is an error.
    pub fn create_backup<S: AsRef<str>>(&self, names: &[S]) -> Result<BackupReport> {
        for name in names {
            validate_collection_name(name.as_ref())?;
        }

        let captured_at = Utc::now();
        let mut archive = Archive::new(captured_at);
        let mut captured = Vec::new();
        let mut absent = Vec::new();

        for name in names {
            let name = name.as_ref();
            if archive.data.contains_key(name) {
                continue;
            }
            let reason = match self.store.snapshot(name) {
                Ok(Some(docs)) => {
                    archive.data.insert(name.to_string(), Some(docs));
                    captured.push(name.to_string());
                    continue;
                }
                Ok(None) => ABSENT_REASON.to_string(),
                Err(e) => e.to_string(),
            };
            warn!(collection = name, reason = %reason, "collection not captured in backup");
            archive.data.insert(name.to_string(), None);
            archive.errors.insert(name.to_string(), reason.clone());
            absent.push(AbsentCollection {
                name: name.to_string(),
                reason,
            });
        }

        let bytes = serde_json::to_vec_pretty(&archive)?;
        let (archive_id, path) = self.publish(captured_at, &bytes)?;

        info!(
            archive = %archive_id,
            captured = captured.len(),
            absent = absent.len(),
            "backup written"
        );
        Ok(BackupReport {
            archive_id,
            path,
            captured_at,
            captured,
            absent,
        })
    }

    fn publish(&self, captured_at: DateTime<Utc>, bytes: &[u8]) -> Result<(ArchiveId, PathBuf)> {
        let _naming = self.naming.lock();
        fs::create_dir_all(&self.backup_dir)?;

        let base = ArchiveId::for_capture(captured_at);
        let mut archive_id = base.clone();
        let mut n = 0;
        while self.archive_path(&archive_id).exists() {
            n += 1;
            archive_id = base.with_suffix(n);
        }

        let path = self.archive_path(&archive_id);
        write_atomic(&path, bytes)?;
        Ok((archive_id, path))
    }

    /// Read and fully validate an archive.
    pub fn load_archive(&self, id: &ArchiveId) -> Result<Archive> {
        let path = self.archive_path(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::ArchiveNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Archive::parse(&text, &path)
    }

    /// Replace every collection present in the archive.
    ///
    /// Validation happens before any write; a malformed archive leaves the
    /// store untouched. Write failures produce a partial report, not an error.
    pub fn restore_backup(&self, id: &ArchiveId) -> Result<RestoreReport> {
        let archive = self.load_archive(id)?;

        let mut report = RestoreReport {
            archive_id: id.clone(),
            captured_at: archive.timestamp,
            restored: Vec::new(),
            skipped: Vec::new(),
            failed: None,
            pending: Vec::new(),
        };

        for (name, docs) in archive.data {
            let Some(docs) = docs else {
                report.skipped.push(name);
                continue;
            };
            if report.failed.is_some() {
                report.pending.push(name);
                continue;
            }
            match self.store.write(&name, &docs) {
                Ok(()) => report.restored.push(name),
                Err(error) => {
                    warn!(archive = %id, collection = %name, error = %error, "restore failed");
                    report.failed = Some(RestoreFailure {
                        collection: name,
                        error,
                    });
                }
            }
        }

        info!(
            archive = %id,
            restored = report.restored.len(),
            skipped = report.skipped.len(),
            complete = report.is_complete(),
            "restore finished"
        );
        Ok(report)
    }

    /// Archive ids in the backup directory, oldest first.
    pub fn list_backups(&self) -> Result<Vec<ArchiveId>> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(ARCHIVE_PREFIX) && name.ends_with(ARCHIVE_EXT) {
                if let Ok(id) = ArchiveId::parse(name) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn latest_backup(&self) -> Result<Option<ArchiveId>> {
        Ok(self.list_backups()?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as StoreErrorKind;
    use crate::model::Document;
    use crate::store::MemBackend;
    use serde_json::{json, Value};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, BackupManager<MemBackend>) {
        let dir = tempdir().unwrap();
        let store = Arc::new(CollectionStore::with_backend(MemBackend::new()));
        let manager = BackupManager::new(store, dir.path().join("backups"));
        (dir, manager)
    }

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn backup_records_missing_and_corrupt_collections_as_absent() {
        let (_dir, manager) = setup();
        manager
            .store()
            .write("rebels-ranking", &[doc(json!({"id": 1}))])
            .unwrap();
        manager.store().backend().put_raw("notifications", "[oops");

        let report = manager
            .create_backup(&["rebels-ranking", "notifications", "dashboard-stats"])
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.captured, vec!["rebels-ranking"]);
        let absent: Vec<&str> = report.absent.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(absent, vec!["notifications", "dashboard-stats"]);

        let archive = manager.load_archive(&report.archive_id).unwrap();
        assert!(archive.data["notifications"].is_none());
        assert!(archive.errors["notifications"].contains("Corrupt data"));
        assert_eq!(archive.errors["dashboard-stats"], ABSENT_REASON);
    }

    #[test]
    fn backup_rejects_invalid_names_before_writing() {
        let (_dir, manager) = setup();
        let err = manager.create_backup(&["../x"]).unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Validation);
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn same_instant_backups_get_distinct_ids() {
        let (_dir, manager) = setup();
        let first = manager.create_backup(&["a"]).unwrap();
        let second = manager.create_backup(&["a"]).unwrap();
        assert_ne!(first.archive_id, second.archive_id);
        assert_eq!(manager.list_backups().unwrap().len(), 2);
        assert_eq!(manager.latest_backup().unwrap(), Some(second.archive_id));
    }

    #[test]
    fn many_collisions_keep_latest_last() {
        let (_dir, manager) = setup();
        let captured_at = Utc::now();
        let mut published = Vec::new();
        for _ in 0..12 {
            let (id, _) = manager.publish(captured_at, b"{}").unwrap();
            published.push(id);
        }

        assert_eq!(manager.list_backups().unwrap(), published);
        assert_eq!(manager.latest_backup().unwrap(), published.pop());
    }

    #[test]
    fn restore_stops_at_first_write_failure() {
        let (_dir, manager) = setup();
        let store = manager.store();
        store.write("a-first", &[doc(json!({"id": 1}))]).unwrap();
        store.write("b-second", &[doc(json!({"id": 2}))]).unwrap();
        store.write("c-third", &[doc(json!({"id": 3}))]).unwrap();
        let report = manager
            .create_backup(&["a-first", "b-second", "c-third"])
            .unwrap();

        store.write("a-first", &[]).unwrap();
        store.write("b-second", &[]).unwrap();
        store.write("c-third", &[]).unwrap();
        store.backend().fail_writes_for("b-second");

        let restore = manager.restore_backup(&report.archive_id).unwrap();

        assert!(!restore.is_complete());
        assert_eq!(restore.restored, vec!["a-first"]);
        let failed = restore.failed.as_ref().unwrap();
        assert_eq!(failed.collection, "b-second");
        assert_eq!(failed.error.kind(), StoreErrorKind::Io);
        assert_eq!(restore.pending, vec!["c-third"]);

        assert_eq!(store.list("a-first").unwrap().len(), 1);
        assert!(store.list("b-second").unwrap().is_empty());
        assert!(store.list("c-third").unwrap().is_empty());
    }

    #[test]
    fn restore_skips_null_entries() {
        let (_dir, manager) = setup();
        manager
            .store()
            .write("rebels-ranking", &[doc(json!({"id": 1}))])
            .unwrap();
        let report = manager
            .create_backup(&["rebels-ranking", "notifications"])
            .unwrap();

        let restore = manager.restore_backup(&report.archive_id).unwrap();

        assert!(restore.is_complete());
        assert_eq!(restore.restored, vec!["rebels-ranking"]);
        assert_eq!(restore.skipped, vec!["notifications"]);
        assert!(manager.store().snapshot("notifications").unwrap().is_none());
    }

    #[test]
    fn restore_of_unknown_archive_is_not_found() {
        let (_dir, manager) = setup();
        let id = ArchiveId::parse("backup-missing").unwrap();
        let err = manager.restore_backup(&id).unwrap_err();
        assert!(matches!(err, StoreError::ArchiveNotFound(_)));
        assert_eq!(err.kind(), StoreErrorKind::NotFound);
    }

    #[test]
    fn list_backups_ignores_foreign_files() {
        let (_dir, manager) = setup();
        fs::create_dir_all(manager.backup_dir()).unwrap();
        fs::write(manager.backup_dir().join("notes.txt"), "x").unwrap();
        fs::write(manager.backup_dir().join("backup-a.json.tmp"), "x").unwrap();
        fs::write(manager.backup_dir().join("backup-a.json"), "{}").unwrap();

        let ids = manager.list_backups().unwrap();
        assert_eq!(ids, vec![ArchiveId::parse("backup-a").unwrap()]);
    }

    #[test]
    fn list_backups_without_directory_is_empty() {
        let (_dir, manager) = setup();
        assert!(manager.list_backups().unwrap().is_empty());
        assert_eq!(manager.latest_backup().unwrap(), None);
    }
}
