use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::lock::{acquire_read_lock, acquire_write_lock};
use crate::models::TestMetadata;

/// Fixed identifier the session backup is stored under
pub const BACKUP_KEY: &str = "tracematrix-session-backup";

/// Auto-saved copy of the working document, rewritten after every mutation
/// so an unsaved session can be recovered
#[derive(Debug, Clone)]
pub struct SessionBackup {
    path: PathBuf,
}

impl SessionBackup {
    /// Backup stored as `<dir>/tracematrix-session-backup.json`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", BACKUP_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// When the backup was last written
    pub fn modified(&self) -> Option<DateTime<Local>> {
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(DateTime::<Local>::from(modified))
    }

    pub fn write(&self, metadata: &TestMetadata) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let _lock = acquire_write_lock(&self.path)?;
        let json = serde_json::to_string(metadata)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session backup: {:?}", self.path))?;
        log::debug!("Session backup written to {:?}", self.path);
        Ok(())
    }

    /// Reads the backup back; `None` when no backup exists
    pub fn read(&self) -> Result<Option<TestMetadata>> {
        if !self.exists() {
            return Ok(None);
        }
        let _lock = acquire_read_lock(&self.path)?;
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session backup: {:?}", self.path))?;
        let metadata = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse session backup: {:?}", self.path))?;
        Ok(Some(metadata))
    }

    pub fn discard(&self) -> Result<()> {
        if self.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove session backup: {:?}", self.path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Test;
    use tempfile::TempDir;

    #[test]
    fn test_backup_round_trip() {
        let dir = TempDir::new().unwrap();
        let backup = SessionBackup::new(dir.path());

        assert!(!backup.exists());
        assert!(backup.read().unwrap().is_none());
        assert!(backup.modified().is_none());

        let mut metadata = TestMetadata::new();
        metadata.tests.push(Test::new("1"));
        backup.write(&metadata).unwrap();

        assert!(backup.exists());
        assert!(backup.modified().is_some());
        assert!(backup
            .path()
            .ends_with("tracematrix-session-backup.json"));
        assert_eq!(backup.read().unwrap(), Some(metadata));
    }

    #[test]
    fn test_discard() {
        let dir = TempDir::new().unwrap();
        let backup = SessionBackup::new(dir.path());
        backup.write(&TestMetadata::new()).unwrap();
        backup.discard().unwrap();
        assert!(!backup.exists());
        backup.discard().unwrap();
    }
}
