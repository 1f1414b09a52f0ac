use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Path of the advisory lock file kept next to `path`
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

fn wait_for<F>(target: &Path, mut try_lock: F) -> Result<()>
where
    F: FnMut() -> std::io::Result<()>,
{
    let start = Instant::now();
    loop {
        match try_lock() {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if start.elapsed() > LOCK_TIMEOUT {
                    anyhow::bail!(
                        "Timeout waiting for file lock - another tmx process may be writing: {:?}",
                        target
                    );
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to acquire lock on {:?}", target))
            }
        }
    }
}

/// Takes an exclusive lock for writing `target`.
///
/// The lock is released when the returned handle is dropped.
pub fn acquire_write_lock(target: &Path) -> Result<File> {
    let lock_path = lock_path_for(target);
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file: {:?}", lock_path))?;

    wait_for(target, || FileExt::try_lock_exclusive(&lock_file))?;

    let _ = writeln!(
        lock_file,
        "Locked by PID {} at {}",
        std::process::id(),
        chrono::Utc::now().to_rfc3339()
    );
    Ok(lock_file)
}

/// Takes a shared lock for reading `target`, if anyone ever locked it
pub fn acquire_read_lock(target: &Path) -> Result<Option<File>> {
    let lock_path = lock_path_for(target);
    if !lock_path.exists() {
        return Ok(None);
    }

    let lock_file = OpenOptions::new()
        .read(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {:?}", lock_path))?;

    wait_for(target, || FileExt::try_lock_shared(&lock_file))?;
    Ok(Some(lock_file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_is_sibling() {
        let path = Path::new("/tmp/docs/TestMetadata.json");
        assert_eq!(
            lock_path_for(path),
            PathBuf::from("/tmp/docs/TestMetadata.json.lock")
        );
    }

    #[test]
    fn test_write_then_read_lock() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doc.json");

        assert!(acquire_read_lock(&target).unwrap().is_none());

        let write_lock = acquire_write_lock(&target).unwrap();
        drop(write_lock);

        assert!(lock_path_for(&target).exists());
        assert!(acquire_read_lock(&target).unwrap().is_some());
    }
}
