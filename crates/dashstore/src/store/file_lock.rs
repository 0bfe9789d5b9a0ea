use crate::error::{Result, StoreError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Exclusive advisory lock on a collection's lock file, released on drop.
///
/// Backends that live in a single process hand out [`CollectionGuard::unlocked`];
/// the in-process lock registry already serializes them.
#[derive(Debug)]
pub struct CollectionGuard {
    file: Option<File>,
}

impl CollectionGuard {
    pub fn unlocked() -> Self {
        Self { file: None }
    }

    /// Lock `path` exclusively, creating it if needed. Gives up with
    /// `Conflict` once `timeout` has passed.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Self { file: Some(file) }),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::Conflict(format!(
                            "timed out after {:?} waiting for lock file {}",
                            timeout,
                            path.display()
                        )));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for CollectionGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_holder_times_out_as_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".rebels-ranking.lock");
        let first = CollectionGuard::acquire(&path, Duration::from_millis(50)).unwrap();
        assert!(first.is_held());

        let err = CollectionGuard::acquire(&path, Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".notifications.lock");
        drop(CollectionGuard::acquire(&path, Duration::from_millis(50)).unwrap());
        assert!(CollectionGuard::acquire(&path, Duration::from_millis(50)).is_ok());
    }
}
