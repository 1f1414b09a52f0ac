//! Error types for traceability engine operations.

use thiserror::Error;

use crate::models::{AssociationKind, EntityKind};
use crate::document::ReadSource;

/// The error type for engine operations.
///
/// None of these are fatal: each one aborts the requested operation and
/// leaves the document exactly as it was.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An operation needed a loaded document and none is loaded.
    #[error("Load metadata first.")]
    NoDocument,

    /// An operation needed a selected RDD and none is selected.
    #[error("Select an RDD first.")]
    NoRddSelected,

    /// The named entity does not exist.
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },

    /// An add/edit command carried an incomplete entity.
    #[error("Invalid {kind}: {reason}")]
    InvalidEntity { kind: EntityKind, reason: String },

    /// The feature file's `@Id_` and `Scenario:` lines do not pair up.
    #[error("Unmatched Test Ids / Scenarios. Review feature file.")]
    UnmatchedTags { tag_lines: usize },

    /// The test-result report is not well-formed XML.
    #[error("Failed to parse test results XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// A paste was requested without choosing which list to paste into.
    #[error("Select a tag kind first.")]
    NoKindSelected,

    /// A paste was requested but nothing is staged for that list.
    #[error("Nothing copied for {0}.")]
    NothingStaged(AssociationKind),

    /// A file read finished after a newer read of the same input was applied.
    #[error("Discarded stale {input} read #{ticket}; read #{applied} was already applied")]
    StaleRead {
        input: ReadSource,
        ticket: u64,
        applied: u64,
    },
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
