use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

/// Publish `bytes` at `target` in one rename.
///
/// The payload goes to a hidden temp file in the same directory first, so a
/// reader sees either the previous file or the complete new one. Once the
/// rename succeeds the write is reported as done; a later directory sync
/// failure is only logged.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let tmp_path = dir.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));

    let written = write_and_sync(&tmp_path, bytes).and_then(|_| fs::rename(&tmp_path, target));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    sync_dir_after_publish(dir);
    Ok(())
}

fn sync_dir_after_publish(dir: &Path) {
    if let Err(e) = fsync_dir(dir) {
        warn!(dir = %dir.display(), error = %e, "directory sync failed after publish");
    }
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
