use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::clipboard::TagClipboard;
use crate::models::Scenario;

/// Per-user working state that outlives a single command: the selected
/// RDD, the tag clipboard and the scenarios of the last feature file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_rdd: Option<String>,

    #[serde(default)]
    pub clipboard: TagClipboard,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<Scenario>>,
}

/// Reads and writes [`SessionState`] as `<dir>/session.json`
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved session, or a fresh one if none was saved
    pub fn load(&self) -> Result<SessionState> {
        if !self.path.exists() {
            return Ok(SessionState::default());
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {:?}", self.path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse session file: {:?}", self.path))
    }

    pub fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file: {:?}", self.path))
    }

    pub fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
