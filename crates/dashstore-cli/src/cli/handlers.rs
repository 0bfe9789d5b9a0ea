//! Command handlers for the dashstore CLI.
//!
//! Each handler takes the shared [`AppState`] plus already-parsed arguments and
//! returns an [`Outcome`]: the JSON to print and whether the operation fully
//! succeeded. Handlers never print and never exit.

use anyhow::Result;
use dashstore::backup::RestoreReport;
use dashstore::catalog;
use dashstore::{
    ArchiveId, BackupManager, CollectionStore, CreateOptions, DocId, Document, FsBackend, IdKind,
    Placement, StoreConfig, StoreError,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

/// Store, backups and the configuration they were built from.
pub struct AppState {
    pub config: StoreConfig,
    pub store: Arc<CollectionStore<FsBackend>>,
    pub backups: BackupManager<FsBackend>,
}

impl AppState {
    pub fn new(config: StoreConfig) -> Self {
        let store = Arc::new(CollectionStore::open(&config));
        let backups = BackupManager::new(Arc::clone(&store), &config.backup_dir);
        Self {
            config,
            store,
            backups,
        }
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub value: Value,
    pub complete: bool,
}

impl Outcome {
    fn done(value: Value) -> Self {
        Self {
            value,
            complete: true,
        }
    }
}

#[derive(Serialize)]
struct RestoreFailureView<'a> {
    collection: &'a str,
    kind: &'static str,
    error: String,
}

#[derive(Serialize)]
struct RestoreView<'a> {
    archive_id: &'a ArchiveId,
    captured_at: String,
    restored: &'a [String],
    skipped: &'a [String],
    failed: Option<RestoreFailureView<'a>>,
    pending: &'a [String],
}

impl<'a> From<&'a RestoreReport> for RestoreView<'a> {
    fn from(report: &'a RestoreReport) -> Self {
        Self {
            archive_id: &report.archive_id,
            captured_at: report.captured_at.to_rfc3339(),
            restored: &report.restored,
            skipped: &report.skipped,
            failed: report.failed.as_ref().map(|f| RestoreFailureView {
                collection: &f.collection,
                kind: f.error.code_str(),
                error: f.error.to_string(),
            }),
            pending: &report.pending,
        }
    }
}

pub fn init(state: &AppState) -> Result<Outcome> {
    catalog::bootstrap(&state.store)?;
    let mut collections = Vec::new();
    for def in catalog::ALL {
        let count = state.store.list(def.name)?.len();
        collections.push(json!({ "name": def.name, "documents": count }));
    }
    Ok(Outcome::done(json!({
        "data_dir": state.config.data_dir,
        "collections": collections,
    })))
}

pub fn collections(state: &AppState) -> Result<Outcome> {
    let names = state.store.collection_names()?;
    Ok(Outcome::done(json!(names)))
}

pub fn list(state: &AppState, collection: &str) -> Result<Outcome> {
    let docs = state.store.list(collection)?;
    Ok(Outcome::done(serde_json::to_value(docs)?))
}

pub fn get(state: &AppState, collection: &str, id: &str) -> Result<Outcome> {
    let doc = state.store.get_by_id(collection, &resolve_id(collection, id))?;
    Ok(Outcome::done(doc.into_value()))
}

pub fn create(
    state: &AppState,
    collection: &str,
    document: &str,
    head: bool,
    text_ids: bool,
) -> Result<Outcome> {
    let doc = Document::from_value(read_json_arg(document)?)?;
    let options = create_options(collection, head, text_ids);
    let created = state.store.create(collection, doc, options)?;
    Ok(Outcome::done(created.into_value()))
}

pub fn update(state: &AppState, collection: &str, id: &str, fields: &str) -> Result<Outcome> {
    let partial = Document::from_value(read_json_arg(fields)?)?;
    let updated = state
        .store
        .update(collection, &resolve_id(collection, id), &partial)?;
    Ok(Outcome::done(updated.into_value()))
}

pub fn delete(state: &AppState, collection: &str, id: &str) -> Result<Outcome> {
    let removed = state.store.delete(collection, &resolve_id(collection, id))?;
    Ok(Outcome::done(removed.into_value()))
}

pub fn replace(state: &AppState, collection: &str, documents: &str) -> Result<Outcome> {
    let docs = match read_json_arg(documents)? {
        Value::Array(items) => items
            .into_iter()
            .map(Document::from_value)
            .collect::<std::result::Result<Vec<_>, StoreError>>()?,
        _ => {
            return Err(
                StoreError::Validation("replace expects a JSON array of objects".into()).into(),
            )
        }
    };
    state.store.write(collection, &docs)?;
    Ok(Outcome::done(json!({
        "collection": collection,
        "documents": docs.len(),
    })))
}

pub fn backup(state: &AppState, collections: &[String]) -> Result<Outcome> {
    let report = if collections.is_empty() {
        catalog::backup_dashboard(&state.backups)?
    } else {
        state.backups.create_backup(collections)?
    };
    Ok(Outcome {
        complete: report.is_complete(),
        value: serde_json::to_value(&report)?,
    })
}

pub fn backups(state: &AppState) -> Result<Outcome> {
    let ids = state.backups.list_backups()?;
    Ok(Outcome::done(json!(ids)))
}

pub fn restore(state: &AppState, archive: &str) -> Result<Outcome> {
    let id = if archive == "latest" {
        state.backups.latest_backup()?.ok_or_else(|| {
            StoreError::ArchiveNotFound(format!(
                "no backups in {}",
                state.backups.backup_dir().display()
            ))
        })?
    } else {
        ArchiveId::parse(archive)?
    };
    let report = state.backups.restore_backup(&id)?;
    Ok(Outcome {
        complete: report.is_complete(),
        value: serde_json::to_value(RestoreView::from(&report))?,
    })
}

/// Catalog collections always use their own policy; flags apply to the rest.
fn create_options(collection: &str, head: bool, text_ids: bool) -> CreateOptions {
    if let Some(def) = catalog::find(collection) {
        if head || text_ids {
            debug!(collection, "catalog policy overrides --head/--text-ids");
        }
        return def.create_options();
    }
    CreateOptions {
        id_kind: if text_ids { IdKind::Text } else { IdKind::Numeric },
        placement: if head { Placement::Head } else { Placement::Tail },
    }
}

/// Text-id catalog collections take the argument verbatim; elsewhere
/// integers become numeric ids.
fn resolve_id(collection: &str, raw: &str) -> DocId {
    match catalog::find(collection) {
        Some(def) if def.id_kind == IdKind::Text => DocId::Text(raw.to_string()),
        _ => DocId::parse_lenient(raw),
    }
}

/// Parse a JSON argument; `-` reads it from stdin.
fn read_json_arg(arg: &str) -> Result<Value> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        arg.to_string()
    };
    let value = serde_json::from_str(&text)
        .map_err(|e| StoreError::Validation(format!("invalid JSON argument: {}", e)))?;
    Ok(value)
}
