use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::lock::{acquire_read_lock, acquire_write_lock};
use crate::models::TestMetadata;

/// Default file name of a metadata document
pub const DEFAULT_METADATA_FILENAME: &str = "TestMetadata.json";

/// Loads and saves a metadata document as JSON, with advisory file locking
pub struct Storage {
    file_path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path to the metadata file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// File name without the `.json` extension, for status lines
    pub fn display_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().replace(".json", ""))
            .unwrap_or_default()
    }

    /// Creates an empty document on disk; fails if the file already exists
    pub fn init(&self) -> Result<TestMetadata> {
        if self.exists() {
            anyhow::bail!("Metadata file already exists: {:?}", self.file_path);
        }
        let mut metadata = TestMetadata::new();
        self.save(&mut metadata)?;
        Ok(metadata)
    }

    /// Loads the document
    pub fn load(&self) -> Result<TestMetadata> {
        if !self.exists() {
            anyhow::bail!(
                "Metadata file not found: {:?}. Run 'tmx init' to create one.",
                self.file_path
            );
        }
        let _lock = acquire_read_lock(&self.file_path)?;

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        let metadata: TestMetadata = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse JSON from {:?}", self.file_path))?;

        log::info!(
            "Loaded {} tests and {} RDDs from {:?}",
            metadata.tests.len(),
            metadata.rdds.len(),
            self.file_path
        );
        Ok(metadata)
    }

    /// Writes the document as pretty JSON with dangling references pruned.
    ///
    /// The pruning is applied to `metadata` only once the file is written.
    /// Returns the number of references pruned.
    pub fn save(&self, metadata: &mut TestMetadata) -> Result<usize> {
        let mut sanitized = metadata.clone();
        let pruned = sanitized.sanitize();

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let _lock = acquire_write_lock(&self.file_path)?;

        let json = serde_json::to_string_pretty(&sanitized)?;
        fs::write(&self.file_path, json)
            .with_context(|| format!("Failed to write file: {:?}", self.file_path))?;

        *metadata = sanitized;
        log::info!("Saved metadata to {:?}", self.file_path);
        Ok(pruned)
    }
}
