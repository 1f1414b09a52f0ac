//! The working document and every operation a front end may issue on it.
//!
//! [`Document`] owns the optional loaded [`TestMetadata`] together with the
//! session state around it. Each operation checks its preconditions first
//! (a loaded document, a selected RDD) and either applies completely or
//! not at all. Successful mutations bump the revision counter and rewrite
//! the session backup.

use std::fmt;

use crate::backup::SessionBackup;
use crate::clipboard::TagClipboard;
use crate::duplicates::{detect_duplicates, DuplicateReport};
use crate::error::{EngineError, Result};
use crate::feature_file::parse_feature_file;
use crate::models::{
    AssociationKind, EntityKind, KeyedRecord, Rdd, Requirement, Scenario, Test, TestMetadata,
};
use crate::results::ImportSummary;
use crate::session::SessionState;
use crate::storage::Storage;

/// The kinds of file a document reads its inputs from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Metadata,
    FeatureFile,
    TestResults,
}

impl ReadSource {
    fn index(self) -> usize {
        match self {
            ReadSource::Metadata => 0,
            ReadSource::FeatureFile => 1,
            ReadSource::TestResults => 2,
        }
    }
}

impl fmt::Display for ReadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadSource::Metadata => write!(f, "metadata"),
            ReadSource::FeatureFile => write!(f, "feature file"),
            ReadSource::TestResults => write!(f, "test results"),
        }
    }
}

/// Handed out when a file read starts and presented when it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTicket {
    source: ReadSource,
    seq: u64,
}

/// Orders read completions per input: a completion older than one already
/// applied for the same input is refused
#[derive(Debug, Default)]
struct ReadSequencer {
    issued: [u64; 3],
    applied: [u64; 3],
}

impl ReadSequencer {
    fn begin(&mut self, source: ReadSource) -> ReadTicket {
        let slot = &mut self.issued[source.index()];
        *slot += 1;
        ReadTicket { source, seq: *slot }
    }

    fn accept(&mut self, ticket: ReadTicket) -> Result<()> {
        let applied = &mut self.applied[ticket.source.index()];
        if ticket.seq <= *applied {
            log::warn!(
                "Discarding stale {} read #{} (#{} already applied)",
                ticket.source,
                ticket.seq,
                applied
            );
            return Err(EngineError::StaleRead {
                input: ticket.source,
                ticket: ticket.seq,
                applied: *applied,
            });
        }
        *applied = ticket.seq;
        Ok(())
    }
}

/// Outcome of a save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Dangling references dropped by the pre-save sanitization
    pub pruned: usize,
    pub duplicates: DuplicateReport,
}

#[derive(Debug, Default)]
pub struct Document {
    metadata: Option<TestMetadata>,
    metadata_name: Option<String>,
    scenarios: Option<Vec<Scenario>>,
    feature_file: Option<String>,
    selected_rdd: Option<String>,
    clipboard: TagClipboard,
    duplicates: DuplicateReport,
    revision: u64,
    reads: ReadSequencer,
    backup: Option<SessionBackup>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the session backup written after every mutation
    pub fn with_backup(mut self, backup: SessionBackup) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn metadata(&self) -> Result<&TestMetadata> {
        self.metadata.as_ref().ok_or(EngineError::NoDocument)
    }

    /// Increases on every structural change; front ends compare it to
    /// decide whether to re-render
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Duplicate report from the most recent load or save
    pub fn duplicates(&self) -> &DuplicateReport {
        &self.duplicates
    }

    pub fn scenarios(&self) -> Option<&[Scenario]> {
        self.scenarios.as_deref()
    }

    pub fn selected_rdd(&self) -> Option<&str> {
        self.selected_rdd.as_deref()
    }

    pub fn clipboard(&self) -> &TagClipboard {
        &self.clipboard
    }

    pub fn metadata_status(&self) -> String {
        match (&self.metadata, &self.metadata_name) {
            (Some(_), Some(name)) if !name.is_empty() => format!("{} (OK)", name),
            (Some(_), _) => "OK".to_string(),
            (None, _) => "not loaded".to_string(),
        }
    }

    pub fn feature_status(&self) -> String {
        match &self.scenarios {
            Some(scenarios) => {
                let name = self
                    .feature_file
                    .as_deref()
                    .map(|f| f.replace(".feature", ""))
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "OK".to_string());
                format!("{} ({} scenarios)", name, scenarios.len())
            }
            None => "not loaded".to_string(),
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
        if let (Some(backup), Some(metadata)) = (&self.backup, &self.metadata) {
            if let Err(e) = backup.write(metadata) {
                log::warn!("Failed to write session backup: {:#}", e);
            }
        }
    }

    /// Runs `f` on the loaded document and records the change.
    ///
    /// `f` must check everything it can fail on before it modifies anything.
    fn mutate<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TestMetadata) -> Result<T>,
    {
        let metadata = self.metadata.as_mut().ok_or(EngineError::NoDocument)?;
        let value = f(metadata)?;
        self.touch();
        Ok(value)
    }

    fn require_selected_rdd(&self) -> Result<String> {
        self.metadata()?;
        self.selected_rdd.clone().ok_or(EngineError::NoRddSelected)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Registers the start of a file read
    pub fn begin_read(&mut self, source: ReadSource) -> ReadTicket {
        self.reads.begin(source)
    }

    /// Installs a freshly loaded document and re-runs duplicate detection
    pub fn apply_metadata(
        &mut self,
        ticket: ReadTicket,
        metadata: TestMetadata,
        name: Option<String>,
    ) -> Result<&DuplicateReport> {
        self.reads.accept(ticket)?;

        self.duplicates = detect_duplicates(&metadata);
        if let Some(release) = &self.selected_rdd {
            if metadata.find_rdd(release).is_none() {
                self.selected_rdd = None;
            }
        }
        self.metadata = Some(metadata);
        self.metadata_name = name;
        self.revision += 1;
        Ok(&self.duplicates)
    }

    /// Replaces the working scenario list with the feature file's scenarios.
    ///
    /// On unmatched tags the scenario list is cleared and the document is
    /// left untouched. Returns the number of scenarios.
    pub fn apply_feature_file(
        &mut self,
        ticket: ReadTicket,
        name: Option<String>,
        content: &str,
    ) -> Result<usize> {
        self.reads.accept(ticket)?;

        match parse_feature_file(content) {
            Ok(scenarios) => {
                let count = scenarios.len();
                self.scenarios = Some(scenarios);
                self.feature_file = name;
                self.materialize_scenarios();
                Ok(count)
            }
            Err(e) => {
                self.scenarios = None;
                self.feature_file = None;
                Err(e)
            }
        }
    }

    /// Merges the test ids of an XML result report into the document
    pub fn apply_test_results(&mut self, ticket: ReadTicket, xml: &str) -> Result<ImportSummary> {
        self.metadata()?;
        self.reads.accept(ticket)?;

        let summary = self.mutate(|m| m.import_test_results(xml))?;
        Ok(summary)
    }

    /// Creates a test for every scenario id that has none yet
    fn materialize_scenarios(&mut self) -> usize {
        let (Some(metadata), Some(scenarios)) = (self.metadata.as_mut(), self.scenarios.as_ref())
        else {
            return 0;
        };
        let created = scenarios
            .iter()
            .filter(|s| metadata.lookup_test(&s.id).was_created())
            .count();
        if created > 0 {
            log::info!("Created {} test(s) for new scenarios", created);
            self.touch();
        }
        created
    }

    /// Each scenario with the test it drives, creating missing tests
    pub fn scenario_rows(&mut self) -> Result<Vec<(Scenario, Test)>> {
        self.metadata()?;
        self.materialize_scenarios();

        let metadata = self.metadata()?;
        let rows = self
            .scenarios()
            .unwrap_or_default()
            .iter()
            .filter_map(|s| metadata.find_test(&s.id).map(|t| (s.clone(), t.clone())))
            .collect();
        Ok(rows)
    }

    // =========================================================================
    // Load / save
    // =========================================================================

    /// Loads the document from storage
    pub fn open(&mut self, storage: &Storage) -> anyhow::Result<&DuplicateReport> {
        let ticket = self.begin_read(ReadSource::Metadata);
        let metadata = storage.load()?;
        Ok(self.apply_metadata(ticket, metadata, Some(storage.display_name()))?)
    }

    /// Sanitizes and saves the document, then re-runs duplicate detection
    pub fn save(&mut self, storage: &Storage) -> anyhow::Result<SaveReport> {
        let metadata = self.metadata.as_mut().ok_or(EngineError::NoDocument)?;
        let pruned = storage.save(metadata)?;
        self.duplicates = detect_duplicates(metadata);
        if pruned > 0 {
            self.touch();
        }
        Ok(SaveReport {
            pruned,
            duplicates: self.duplicates.clone(),
        })
    }

    /// Replaces the document with the session backup, if there is one
    pub fn recover_from_backup(&mut self) -> anyhow::Result<bool> {
        let Some(backup) = self.backup.clone() else {
            return Ok(false);
        };
        let ticket = self.begin_read(ReadSource::Metadata);
        match backup.read()? {
            Some(metadata) => {
                self.apply_metadata(ticket, metadata, None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn session_state(&self) -> SessionState {
        SessionState {
            selected_rdd: self.selected_rdd.clone(),
            clipboard: self.clipboard.clone(),
            feature_file: self.feature_file.clone(),
            scenarios: self.scenarios.clone(),
        }
    }

    pub fn restore_session(&mut self, state: SessionState) {
        self.selected_rdd = state.selected_rdd;
        self.clipboard = state.clipboard;
        self.feature_file = state.feature_file;
        self.scenarios = state.scenarios;
    }

    // =========================================================================
    // RDDs and requirements
    // =========================================================================

    /// Adds an RDD and selects it
    pub fn add_rdd(&mut self, rdd: Rdd) -> Result<()> {
        let release = rdd.release.clone();
        self.mutate(|m| m.add_rdd(rdd))?;
        self.selected_rdd = Some(release);
        Ok(())
    }

    pub fn select_rdd(&mut self, release: &str) -> Result<()> {
        if self.metadata()?.find_rdd(release).is_none() {
            return Err(EngineError::NotFound {
                kind: EntityKind::Rdd,
                key: release.to_string(),
            });
        }
        self.selected_rdd = Some(release.to_string());
        Ok(())
    }

    /// Edits the selected RDD's release and location
    pub fn edit_rdd(&mut self, edited: Rdd) -> Result<()> {
        let release = self.require_selected_rdd()?;
        let new_release = edited.release.clone();
        self.mutate(|m| m.edit_rdd(&release, edited))?;
        self.selected_rdd = Some(new_release);
        Ok(())
    }

    /// Removes the selected RDD and clears the selection
    pub fn remove_rdd(&mut self) -> Result<Rdd> {
        let release = self.require_selected_rdd()?;
        let removed = self.mutate(|m| {
            m.remove_rdd(&release).ok_or(EngineError::NotFound {
                kind: EntityKind::Rdd,
                key: release.clone(),
            })
        })?;
        self.selected_rdd = None;
        Ok(removed)
    }

    /// Adds a requirement to the selected RDD
    pub fn add_requirement(&mut self, requirement: Requirement) -> Result<()> {
        let release = self.require_selected_rdd()?;
        self.mutate(|m| m.add_requirement(&release, requirement))
    }

    /// Edits a requirement of the selected RDD, propagating an id change
    pub fn edit_requirement(&mut self, old_id: &str, edited: Requirement) -> Result<()> {
        let release = self.require_selected_rdd()?;
        self.mutate(|m| m.edit_requirement(&release, old_id, edited))
    }

    /// Removes a requirement of the selected RDD from the RDD and every test
    pub fn remove_requirement(&mut self, id: &str) -> Result<Requirement> {
        let release = self.require_selected_rdd()?;
        self.mutate(|m| {
            m.remove_requirement(&release, id)
                .ok_or_else(|| EngineError::NotFound {
                    kind: EntityKind::Requirement,
                    key: id.to_string(),
                })
        })
    }

    // =========================================================================
    // Designs, features and user stories
    // =========================================================================

    pub fn add_record<R: KeyedRecord>(&mut self, record: R) -> Result<()> {
        self.mutate(|m| m.add_record(record))
    }

    pub fn edit_record<R: KeyedRecord>(&mut self, old_key: &str, edited: R) -> Result<()> {
        self.mutate(|m| m.edit_record(old_key, edited))
    }

    pub fn remove_record<R: KeyedRecord>(&mut self, key: &str) -> Result<R> {
        self.mutate(|m| {
            m.remove_record::<R>(key).ok_or_else(|| EngineError::NotFound {
                kind: R::KIND,
                key: key.to_string(),
            })
        })
    }

    // =========================================================================
    // Tests and their associations
    // =========================================================================

    pub fn add_test(&mut self, test: Test) -> Result<()> {
        self.mutate(|m| m.add_test(test))
    }

    pub fn edit_test(&mut self, old_id: &str, edited: Test) -> Result<()> {
        self.mutate(|m| m.edit_test(old_id, edited))
    }

    pub fn remove_test(&mut self, id: &str) -> Result<Test> {
        self.mutate(|m| {
            m.remove_test(id).ok_or_else(|| EngineError::NotFound {
                kind: EntityKind::Test,
                key: id.to_string(),
            })
        })
    }

    /// A test's list for `kind`, creating the test if needed
    pub fn values(&mut self, test_id: &str, kind: AssociationKind) -> Result<Vec<String>> {
        let metadata = self.metadata.as_mut().ok_or(EngineError::NoDocument)?;
        let lookup = metadata.lookup_test(test_id);
        let created = lookup.was_created();
        let values = lookup.into_test().values(kind).clone();
        if created {
            self.touch();
        }
        Ok(values)
    }

    pub fn options(
        &self,
        test_id: &str,
        kind: AssociationKind,
        filter: Option<&str>,
    ) -> Result<Vec<String>> {
        Ok(self.metadata()?.options(test_id, kind, filter))
    }

    /// Adds one of the offered values; an unknown value is ignored and
    /// reported as `Ok(None)`
    pub fn add_value(
        &mut self,
        test_id: &str,
        kind: AssociationKind,
        value: &str,
    ) -> Result<Option<String>> {
        let metadata = self.metadata.as_mut().ok_or(EngineError::NoDocument)?;
        let added = metadata.add_value(test_id, kind, value);
        if added.is_some() {
            self.touch();
        }
        Ok(added)
    }

    pub fn remove_value(&mut self, test_id: &str, kind: AssociationKind, value: &str) -> Result<bool> {
        self.mutate(|m| Ok(m.remove_value(test_id, kind, value)))
    }

    // =========================================================================
    // Tag clipboard
    // =========================================================================

    /// Stages a test's list for `kind`
    pub fn copy_tags(&mut self, kind: AssociationKind, test_id: &str) -> Result<usize> {
        let metadata = self.metadata.as_mut().ok_or(EngineError::NoDocument)?;
        let lookup = metadata.lookup_test(test_id);
        let created = lookup.was_created();
        let count = self.clipboard.copy(kind, lookup.into_test());
        if created {
            self.touch();
        }
        Ok(count)
    }

    pub fn can_paste(&self, kind: Option<AssociationKind>) -> bool {
        self.is_loaded() && self.clipboard.can_paste(kind)
    }

    /// Merges the staged list into a test's list for `kind`
    pub fn paste_tags(&mut self, kind: Option<AssociationKind>, test_id: &str) -> Result<usize> {
        let metadata = self.metadata.as_mut().ok_or(EngineError::NoDocument)?;
        let kind = kind.ok_or(EngineError::NoKindSelected)?;
        if !self.clipboard.can_paste(Some(kind)) {
            return Err(EngineError::NothingStaged(kind));
        }
        let added = self.clipboard.paste(Some(kind), metadata.get_test(test_id))?;
        self.touch();
        Ok(added)
    }

    /// Empties a test's list for `kind`
    pub fn clear_tags(&mut self, kind: AssociationKind, test_id: &str) -> Result<usize> {
        self.mutate(|m| Ok(TagClipboard::clear(kind, m.get_test(test_id))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Design;
    use tempfile::TempDir;

    fn loaded() -> Document {
        let mut metadata = TestMetadata::new();
        let mut rdd = Rdd::new("1.0", "rdd-1.0");
        rdd.requirements.push(Requirement::new("R1", "Login"));
        rdd.requirements.push(Requirement::new("R2", "Logout"));
        metadata.rdds.push(rdd);
        metadata.designs.push(Design::new("D1".into(), "design".into()));

        let mut document = Document::new();
        let ticket = document.begin_read(ReadSource::Metadata);
        document.apply_metadata(ticket, metadata, None).unwrap();
        document
    }

    #[test]
    fn test_operations_need_a_document() {
        let mut document = Document::new();
        assert_eq!(document.metadata_status(), "not loaded");
        assert!(matches!(
            document.add_rdd(Rdd::new("1.0", "x")),
            Err(EngineError::NoDocument)
        ));
        assert!(matches!(
            document.add_value("1", AssociationKind::Designs, "D1"),
            Err(EngineError::NoDocument)
        ));
        let ticket = document.begin_read(ReadSource::TestResults);
        assert!(matches!(
            document.apply_test_results(ticket, "<r/>"),
            Err(EngineError::NoDocument)
        ));
        assert_eq!(document.revision(), 0);
    }

    #[test]
    fn test_requirement_operations_need_a_selected_rdd() {
        let mut document = loaded();
        let before = document.metadata().unwrap().clone();

        assert!(matches!(
            document.add_requirement(Requirement::new("R3", "Audit")),
            Err(EngineError::NoRddSelected)
        ));
        assert!(matches!(document.remove_rdd(), Err(EngineError::NoRddSelected)));
        assert_eq!(document.metadata().unwrap(), &before);

        document.select_rdd("1.0").unwrap();
        document
            .add_requirement(Requirement::new("R3", "Audit"))
            .unwrap();
        assert_eq!(document.metadata().unwrap().requirements().count(), 3);
    }

    #[test]
    fn test_add_rdd_selects_it_and_remove_clears_selection() {
        let mut document = loaded();
        document.add_rdd(Rdd::new("2.0", "rdd-2.0")).unwrap();
        assert_eq!(document.selected_rdd(), Some("2.0"));

        document.remove_rdd().unwrap();
        assert_eq!(document.selected_rdd(), None);
        assert!(document.metadata().unwrap().find_rdd("2.0").is_none());
    }

    #[test]
    fn test_add_rdd_with_taken_release_keeps_selection() {
        let mut document = loaded();
        document.add_rdd(Rdd::new("2.0", "rdd-2.0")).unwrap();
        let start = document.revision();

        assert!(matches!(
            document.add_rdd(Rdd::new("1.0", "second")),
            Err(EngineError::InvalidEntity { kind: EntityKind::Rdd, .. })
        ));
        assert_eq!(document.selected_rdd(), Some("2.0"));
        assert_eq!(document.revision(), start);
        assert_eq!(document.metadata().unwrap().rdds.len(), 2);

        document
            .add_requirement(Requirement::new("R9", "Export"))
            .unwrap();
        let metadata = document.metadata().unwrap();
        assert_eq!(metadata.find_rdd("2.0").unwrap().requirements[0].id, "R9");
        assert_eq!(metadata.find_rdd("1.0").unwrap().requirements.len(), 2);
    }

    #[test]
    fn test_select_unknown_rdd_fails() {
        let mut document = loaded();
        assert!(matches!(
            document.select_rdd("9.9"),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut document = loaded();
        let start = document.revision();

        assert_eq!(
            document
                .add_value("1", AssociationKind::Designs, "nope")
                .unwrap(),
            None
        );
        assert_eq!(document.revision(), start);

        document.add_value("1", AssociationKind::Designs, "d1").unwrap();
        assert_eq!(document.revision(), start + 1);
    }

    #[test]
    fn test_edit_requirement_propagates_through_document() {
        let mut document = loaded();
        document.select_rdd("1.0").unwrap();
        document.add_value("7", AssociationKind::Requirements, "R1").unwrap();

        document
            .edit_requirement("R1", Requirement::new("R1X", "Login"))
            .unwrap();

        let test = document.metadata().unwrap().find_test("7").unwrap();
        assert_eq!(test.requirement_ids, vec!["R1X"]);
    }

    #[test]
    fn test_feature_file_drives_scenarios_and_tests() {
        let mut document = loaded();
        let ticket = document.begin_read(ReadSource::FeatureFile);
        let count = document
            .apply_feature_file(
                ticket,
                Some("login.feature".into()),
                "@Id_1\nScenario: Login works\n@Id_2\nScenario: Logout works\n",
            )
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(document.feature_status(), "login (2 scenarios)");
        assert_eq!(document.metadata().unwrap().tests.len(), 2);

        let rows = document.scenario_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0.name, "Logout works");
        assert_eq!(rows[1].1.id, "2");
    }

    #[test]
    fn test_malformed_feature_file_clears_scenarios() {
        let mut document = loaded();
        let ticket = document.begin_read(ReadSource::FeatureFile);
        document
            .apply_feature_file(ticket, None, "@Id_1\nScenario: One\n")
            .unwrap();

        let before = document.metadata().unwrap().clone();
        let ticket = document.begin_read(ReadSource::FeatureFile);
        let err = document
            .apply_feature_file(ticket, None, "@Id_1\nScenario: One\n@Id_2\n")
            .unwrap_err();

        assert!(matches!(err, EngineError::UnmatchedTags { .. }));
        assert!(document.scenarios().is_none());
        assert_eq!(document.feature_status(), "not loaded");
        assert_eq!(document.metadata().unwrap(), &before);
    }

    #[test]
    fn test_stale_read_is_discarded() {
        let mut document = loaded();
        let first = document.begin_read(ReadSource::FeatureFile);
        let second = document.begin_read(ReadSource::FeatureFile);

        document
            .apply_feature_file(second, Some("new.feature".into()), "@Id_2\nScenario: New\n")
            .unwrap();
        let err = document
            .apply_feature_file(first, Some("old.feature".into()), "@Id_1\nScenario: Old\n")
            .unwrap_err();

        assert!(matches!(err, EngineError::StaleRead { ticket: 1, applied: 2, .. }));
        assert_eq!(document.scenarios().unwrap()[0].name, "New");
    }

    #[test]
    fn test_reads_of_different_inputs_do_not_interfere() {
        let mut document = loaded();
        let feature = document.begin_read(ReadSource::FeatureFile);
        let results = document.begin_read(ReadSource::TestResults);

        document
            .apply_test_results(results, r#"<r><property value="Id_5"/></r>"#)
            .unwrap();
        document
            .apply_feature_file(feature, None, "@Id_5\nScenario: Five\n")
            .unwrap();
        assert_eq!(document.metadata().unwrap().tests.len(), 1);
    }

    #[test]
    fn test_clipboard_through_document() {
        let mut document = loaded();
        document.add_value("X", AssociationKind::Requirements, "R1").unwrap();
        document.add_value("X", AssociationKind::Requirements, "R2").unwrap();
        document.add_value("Y", AssociationKind::Requirements, "R2").unwrap();

        assert!(!document.can_paste(Some(AssociationKind::Requirements)));
        assert_eq!(document.copy_tags(AssociationKind::Requirements, "X").unwrap(), 2);
        assert!(document.can_paste(Some(AssociationKind::Requirements)));
        assert!(!document.can_paste(None));

        assert_eq!(
            document
                .paste_tags(Some(AssociationKind::Requirements), "Y")
                .unwrap(),
            1
        );
        assert_eq!(
            document.values("Y", AssociationKind::Requirements).unwrap(),
            vec!["R2", "R1"]
        );

        assert_eq!(document.clear_tags(AssociationKind::Requirements, "Y").unwrap(), 2);
        assert!(document
            .values("Y", AssociationKind::Requirements)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_mutations_write_backup_and_recover() {
        let dir = TempDir::new().unwrap();
        let backup = SessionBackup::new(dir.path());
        let mut document = loaded().with_backup(backup.clone());

        assert!(!backup.exists());
        document.add_test({
            let mut test = Test::new("T1");
            test.release = Some("1.0".into());
            test
        })
        .unwrap();
        assert!(backup.exists());

        let mut restored = Document::new().with_backup(backup);
        assert!(restored.recover_from_backup().unwrap());
        assert!(restored.metadata().unwrap().find_test("T1").is_some());
    }

    #[test]
    fn test_save_sanitizes_and_reports_duplicates() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("TestMetadata.json"));
        let mut document = loaded();

        document.add_value("1", AssociationKind::Designs, "D1").unwrap();
        document
            .add_record(Design::new("D1".into(), "copy".into()))
            .unwrap();
        document.remove_record::<Design>("D1").unwrap();

        let report = document.save(&storage).unwrap();
        assert_eq!(report.pruned, 0);
        assert!(document
            .metadata()
            .unwrap()
            .find_test("1")
            .unwrap()
            .design_ids
            .is_empty());
        assert!(report.duplicates.is_empty());

        let mut reopened = Document::new();
        reopened.open(&storage).unwrap();
        assert_eq!(reopened.metadata().unwrap(), document.metadata().unwrap());
        assert_eq!(reopened.metadata_status(), "TestMetadata (OK)");
    }

    #[test]
    fn test_load_reports_duplicate_requirements() {
        let mut metadata = TestMetadata::new();
        let mut rdd = Rdd::new("1.0", "rdd-1.0");
        rdd.requirements.push(Requirement::new("R1", "Login"));
        rdd.requirements.push(Requirement::new("R1", "Login again"));
        metadata.rdds.push(rdd);

        let mut document = Document::new();
        let ticket = document.begin_read(ReadSource::Metadata);
        let report = document.apply_metadata(ticket, metadata.clone(), None).unwrap();
        assert_eq!(
            report.entry(EntityKind::Requirement).unwrap().keys,
            vec!["R1"]
        );

        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("TestMetadata.json"));
        storage.save(&mut metadata).unwrap();
        let mut reopened = Document::new();
        reopened.open(&storage).unwrap();
        assert!(reopened.duplicates().entry(EntityKind::Requirement).is_some());
    }

    #[test]
    fn test_save_reports_duplicate_designs() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("TestMetadata.json"));
        let mut document = loaded();
        assert!(document.duplicates().is_empty());

        document
            .add_record(Design::new("D1".into(), "copy".into()))
            .unwrap();
        let report = document.save(&storage).unwrap();

        assert_eq!(report.duplicates.entry(EntityKind::Design).unwrap().keys, vec!["D1"]);
        assert_eq!(document.duplicates(), &report.duplicates);
    }

    #[test]
    fn test_session_state_round_trip() {
        let mut document = loaded();
        document.select_rdd("1.0").unwrap();
        document.add_value("X", AssociationKind::Designs, "D1").unwrap();
        document.copy_tags(AssociationKind::Designs, "X").unwrap();

        let state = document.session_state();
        let mut other = loaded();
        other.restore_session(state);
        assert_eq!(other.selected_rdd(), Some("1.0"));
        assert!(other.can_paste(Some(AssociationKind::Designs)));
    }
}
