pub mod backup;
pub mod clipboard;
pub mod config;
pub mod document;
pub mod duplicates;
pub mod error;
pub mod export;
pub mod feature_file;
pub mod integrity;
pub mod lock;
pub mod models;
pub mod project;
pub mod results;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use backup::{SessionBackup, BACKUP_KEY};
pub use clipboard::TagClipboard;
pub use config::{get_config_path, Config, DocumentEntry};
pub use document::{Document, ReadSource, ReadTicket, SaveReport};
pub use duplicates::{detect_duplicates, DuplicateEntry, DuplicateReport};
pub use error::{EngineError, Result};
pub use export::{export_csv, export_json, write_csv, CsvView};
pub use feature_file::parse_feature_file;
pub use models::{
    AssociationKind, Design, EntityKind, Feature, KeyedRecord, Rdd, Requirement, Scenario, Test,
    TestLookup, TestMetadata, UserStory,
};
pub use project::determine_metadata_path;
pub use results::ImportSummary;
pub use session::{SessionState, SessionStore};
pub use storage::{Storage, DEFAULT_METADATA_FILENAME};
