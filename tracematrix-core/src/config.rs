use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A metadata document registered under a name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentEntry {
    /// Path to the metadata JSON file
    pub path: String,
    #[serde(default)]
    pub description: String,
}

/// User configuration: named documents and where session state is kept
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub documents: HashMap<String, DocumentEntry>,
    /// Optional default document name
    #[serde(default)]
    pub default_document: Option<String>,
    /// Directory for the session backup and session state
    #[serde(default)]
    pub backup_dir: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the config, or an empty one if the file does not exist yet
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn get_document(&self, name: &str) -> Option<&DocumentEntry> {
        self.documents.get(name)
    }

    /// Document names, sorted
    pub fn list_documents(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.documents.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }

    /// Registers a new document or updates an existing one
    pub fn register_document(&mut self, name: String, path: String, description: String) {
        self.documents
            .insert(name, DocumentEntry { path, description });
    }

    pub fn set_default_document(&mut self, name: &str) -> Result<()> {
        if !self.documents.contains_key(name) {
            anyhow::bail!("Document '{}' not found in config", name);
        }
        self.default_document = Some(name.to_string());
        Ok(())
    }

    pub fn get_default_document(&self) -> Option<(&str, &DocumentEntry)> {
        let name = self.default_document.as_deref()?;
        self.documents.get(name).map(|entry| (name, entry))
    }

    /// The only registered document, if exactly one is registered
    pub fn single_document(&self) -> Option<&DocumentEntry> {
        if self.documents.len() == 1 {
            self.documents.values().next()
        } else {
            None
        }
    }

    /// Where the session backup and session state live
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.backup_dir {
            return Ok(PathBuf::from(dir));
        }
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .context("Failed to determine a data directory")?;
        Ok(data_dir.join("tracematrix"))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Writes an empty config file if none exists
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        if path.as_ref().exists() {
            return Ok(());
        }
        Self::default().save(path)
    }
}

/// Path of the config file: `TMX_CONFIG_PATH` or `~/.tracematrix.config`
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TMX_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

    Ok(home_dir.join(".tracematrix.config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(dir.path().join("none.config")).unwrap();
        assert!(config.documents.is_empty());
        assert!(config.get_default_document().is_none());
    }

    #[test]
    fn test_register_and_default() {
        let mut config = Config::default();
        config.register_document("r7".into(), "/docs/r7.json".into(), "Release 7".into());
        assert_eq!(config.single_document().unwrap().path, "/docs/r7.json");

        config.register_document("r8".into(), "/docs/r8.json".into(), String::new());
        assert!(config.single_document().is_none());
        assert_eq!(config.list_documents(), vec!["r7", "r8"]);

        assert!(config.set_default_document("r9").is_err());
        config.set_default_document("r8").unwrap();
        let (name, entry) = config.get_default_document().unwrap();
        assert_eq!(name, "r8");
        assert_eq!(entry.path, "/docs/r8.json");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(".tracematrix.config");

        Config::create_default(&path).unwrap();
        assert!(path.exists());

        let mut config = Config::load(&path).unwrap();
        config.register_document("main".into(), "TestMetadata.json".into(), String::new());
        config.backup_dir = Some("/var/tmx".into());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.state_dir().unwrap(), PathBuf::from("/var/tmx"));
    }
}
