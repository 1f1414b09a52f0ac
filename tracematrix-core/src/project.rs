use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, Config};
use crate::storage::DEFAULT_METADATA_FILENAME;

/// Determines the metadata file to work on.
///
/// Priority: `--file`, `--doc <name>`, the `TMX_DOC` variable, a
/// `TestMetadata.json` in the current directory, the only registered
/// document, then the default document.
pub fn determine_metadata_path(file: Option<&Path>, doc: Option<&str>) -> Result<PathBuf> {
    let config_path = get_config_path()?;
    let config = Config::load_or_default(&config_path)?;
    let env_doc = env::var("TMX_DOC").ok();
    resolve_metadata_path(&config, file, doc, env_doc.as_deref(), Path::new("."))
}

/// The resolution behind [`determine_metadata_path`], with its inputs explicit
pub fn resolve_metadata_path(
    config: &Config,
    file: Option<&Path>,
    doc: Option<&str>,
    env_doc: Option<&str>,
    cwd: &Path,
) -> Result<PathBuf> {
    if let Some(file) = file {
        return Ok(file.to_path_buf());
    }

    if let Some(name) = doc {
        return match config.get_document(name) {
            Some(entry) => Ok(PathBuf::from(&entry.path)),
            None => anyhow::bail!("Document '{}' not found in config", name),
        };
    }

    if let Some(name) = env_doc {
        return match config.get_document(name) {
            Some(entry) => Ok(PathBuf::from(&entry.path)),
            None => anyhow::bail!("Document '{}' from TMX_DOC not found in config", name),
        };
    }

    let local = cwd.join(DEFAULT_METADATA_FILENAME);
    if local.exists() {
        return Ok(local);
    }

    if let Some(entry) = config.single_document() {
        return Ok(PathBuf::from(&entry.path));
    }

    if let Some((_, entry)) = config.get_default_document() {
        return Ok(PathBuf::from(&entry.path));
    }

    anyhow::bail!(
        "No metadata document found. Pass --file, register one with 'tmx config register', \
         or run 'tmx init' to create {}",
        DEFAULT_METADATA_FILENAME
    )
}
