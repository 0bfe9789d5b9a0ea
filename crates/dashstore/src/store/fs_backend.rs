use super::atomic::write_atomic;
use super::backend::StorageBackend;
use super::codec::{decode_collection, encode_collection};
use super::file_lock::CollectionGuard;
use crate::error::Result;
use crate::model::Document;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const COLLECTION_EXT: &str = "json";

/// One `<name>.json` file per collection under a single data directory.
pub struct FsBackend {
    data_dir: PathBuf,
}

impl FsBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `.<name>.lock` next to the collection file. Never listed as a collection.
    pub fn lock_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!(".{}.lock", name))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            debug!(dir = %path.display(), "creating data directory");
            fs::create_dir_all(path)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn ensure_ready(&self) -> Result<()> {
        self.ensure_dir(&self.data_dir)
    }

    fn load_collection(&self, name: &str) -> Result<Option<Vec<Document>>> {
        let path = self.collection_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_collection(&content, &path).map(Some)
    }

    fn save_collection(&self, name: &str, docs: &[Document]) -> Result<()> {
        self.ensure_dir(&self.data_dir)?;
        let bytes = encode_collection(docs)?;
        write_atomic(&self.collection_path(name), &bytes)
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collection_path(name).try_exists()?)
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", name, COLLECTION_EXT))
    }

    fn lock_collection(&self, name: &str, timeout: Duration) -> Result<CollectionGuard> {
        self.ensure_dir(&self.data_dir)?;
        CollectionGuard::acquire(&self.lock_path(name), timeout)
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(COLLECTION_EXT)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
