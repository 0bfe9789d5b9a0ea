use crate::backup::BackupManager;
use crate::config::StoreConfig;
use crate::store::{CollectionStore, FsBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub config: StoreConfig,
    pub store: Arc<CollectionStore<FsBackend>>,
    pub backups: BackupManager<FsBackend>,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let config = StoreConfig::default().resolve(&root);
        let store = Arc::new(CollectionStore::open(&config));
        let backups = BackupManager::new(Arc::clone(&store), &config.backup_dir);
        Self {
            _temp_dir: temp_dir,
            config,
            store,
            backups,
            root,
        }
    }

    pub fn collection_file(&self, name: &str) -> PathBuf {
        self.config.data_dir.join(format!("{}.json", name))
    }
}
