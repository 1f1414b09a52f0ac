//! Duplicate key detection across every keyed collection.

use std::collections::HashMap;
use std::fmt;

use crate::models::{EntityKind, TestMetadata};

/// Duplicate keys found in one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry {
    pub kind: EntityKind,
    /// Distinct offending keys, in the order they were first seen
    pub keys: Vec<String>,
}

impl fmt::Display for DuplicateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Duplicate {} found! {}",
            self.kind.plural(),
            self.keys.join(", ")
        )
    }
}

/// Result of a duplicate scan; empty when every key is unique
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    pub entries: Vec<DuplicateEntry>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, kind: EntityKind) -> Option<&DuplicateEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }
}

impl fmt::Display for DuplicateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Keys that occur more than once, each reported once
pub fn find_duplicates<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen = Vec::new();
    for key in keys {
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            first_seen.push(key);
        }
        *count += 1;
    }
    first_seen
        .into_iter()
        .filter(|key| counts.get(key).copied().unwrap_or(0) > 1)
        .map(str::to_string)
        .collect()
}

/// Scans tests, requirements (across all RDDs), designs, user stories and
/// features for non-unique keys. Never modifies the document.
pub fn detect_duplicates(metadata: &TestMetadata) -> DuplicateReport {
    let scans: [(EntityKind, Vec<String>); 5] = [
        (
            EntityKind::Test,
            find_duplicates(metadata.tests.iter().map(|t| t.id.as_str())),
        ),
        (
            EntityKind::Requirement,
            find_duplicates(metadata.requirements().map(|r| r.id.as_str())),
        ),
        (
            EntityKind::Design,
            find_duplicates(metadata.designs.iter().map(|d| d.design.as_str())),
        ),
        (
            EntityKind::UserStory,
            find_duplicates(metadata.user_stories.iter().map(|u| u.user_story.as_str())),
        ),
        (
            EntityKind::Feature,
            find_duplicates(metadata.features.iter().map(|f| f.feature.as_str())),
        ),
    ];

    let entries: Vec<DuplicateEntry> = scans
        .into_iter()
        .filter(|(_, keys)| !keys.is_empty())
        .map(|(kind, keys)| DuplicateEntry { kind, keys })
        .collect();

    for entry in &entries {
        log::warn!("{}", entry);
    }

    DuplicateReport { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Design, KeyedRecord, Rdd, Requirement, Test};

    #[test]
    fn test_find_duplicates_reports_each_key_once() {
        let keys = ["a", "b", "a", "c", "a", "b"];
        assert_eq!(find_duplicates(keys), vec!["a", "b"]);
        assert!(find_duplicates(["x", "y"]).is_empty());
    }

    #[test]
    fn test_find_duplicates_keeps_first_seen_order() {
        assert_eq!(find_duplicates(["a", "b", "b", "a"]), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_requirements() {
        let mut metadata = TestMetadata::new();
        let mut rdd = Rdd::new("1.0", "rdd");
        rdd.requirements.push(Requirement::new("A", "first"));
        rdd.requirements.push(Requirement::new("A", "second"));
        rdd.requirements.push(Requirement::new("B", "third"));
        metadata.rdds.push(rdd);

        let report = detect_duplicates(&metadata);
        assert_eq!(report.entries.len(), 1);
        let entry = report.entry(EntityKind::Requirement).unwrap();
        assert_eq!(entry.keys, vec!["A"]);
        assert_eq!(entry.to_string(), "Duplicate Requirements found! A");
    }

    #[test]
    fn test_duplicate_requirements_across_rdds() {
        let mut metadata = TestMetadata::new();
        let mut first = Rdd::new("1.0", "rdd");
        first.requirements.push(Requirement::new("R1", "one"));
        let mut second = Rdd::new("2.0", "rdd");
        second.requirements.push(Requirement::new("R1", "again"));
        metadata.rdds.push(first);
        metadata.rdds.push(second);

        let report = detect_duplicates(&metadata);
        assert_eq!(report.entry(EntityKind::Requirement).unwrap().keys, vec!["R1"]);
    }

    #[test]
    fn test_report_lists_every_kind_with_duplicates() {
        let mut metadata = TestMetadata::new();
        metadata.tests.push(Test::new("1"));
        metadata.tests.push(Test::new("1"));
        metadata.tests.push(Test::new("2"));
        metadata.tests.push(Test::new("2"));
        metadata.designs.push(Design::new("D".into(), "x".into()));
        metadata.designs.push(Design::new("D".into(), "y".into()));

        let report = detect_duplicates(&metadata);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(
            report.to_string(),
            "Duplicate Tests found! 1, 2\nDuplicate Designs found! D"
        );
    }

    #[test]
    fn test_clean_document_has_empty_report() {
        let mut metadata = TestMetadata::new();
        metadata.tests.push(Test::new("1"));
        assert!(detect_duplicates(&metadata).is_empty());
    }
}
