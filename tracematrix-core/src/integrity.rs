//! Reference integrity between tests and the entities they cover.
//!
//! Tests refer to requirements, designs, features and user stories by key.
//! The operations here keep those references valid when an entity is
//! renamed or removed, and prune whatever is left dangling before a save.
//! None of them fail: a missing target is a no-op.

use std::collections::{HashMap, HashSet};

use crate::error::{EngineError, Result};
use crate::models::{AssociationKind, EntityKind, KeyedRecord, Rdd, Requirement, Test, TestMetadata};

/// Maps every value of `values` through `renames` in a single pass.
///
/// A renamed value keeps its position unless the new key is already in the
/// list, in which case the old entry is dropped rather than duplicated.
/// Returns how many entries changed.
fn apply_renames(values: &mut Vec<String>, renames: &HashMap<String, String>) -> usize {
    if !values.iter().any(|v| renames.contains_key(v)) {
        return 0;
    }

    let original = std::mem::take(values);
    let untouched: HashSet<&str> = original
        .iter()
        .filter(|v| !renames.contains_key(v.as_str()))
        .map(String::as_str)
        .collect();

    let mut changed = 0;
    for value in &original {
        match renames.get(value) {
            Some(new) => {
                changed += 1;
                if untouched.contains(new.as_str()) || values.contains(new) {
                    continue;
                }
                values.push(new.clone());
            }
            None => values.push(value.clone()),
        }
    }
    changed
}

fn remove_first(values: &mut Vec<String>, key: &str) -> bool {
    match values.iter().position(|v| v == key) {
        Some(index) => {
            values.remove(index);
            true
        }
        None => false,
    }
}

impl TestMetadata {
    /// Rewrites test references of one kind according to `renames`
    fn rename_references(&mut self, kind: AssociationKind, renames: &HashMap<String, String>) -> usize {
        let touched: usize = self
            .tests
            .iter_mut()
            .map(|test| apply_renames(test.values_mut(kind), renames))
            .sum();
        if touched > 0 {
            log::debug!("Renamed {} {} reference(s)", touched, kind.field_name());
        }
        touched
    }

    /// Replaces `old` with `new` in every test's list of the given kind
    pub fn propagate_rename(&mut self, kind: AssociationKind, old: &str, new: &str) -> usize {
        if old == new {
            return 0;
        }
        let renames = HashMap::from([(old.to_string(), new.to_string())]);
        self.rename_references(kind, &renames)
    }

    /// Removes the first occurrence of `key` from every test's list of the given kind
    pub fn cascade_remove(&mut self, kind: AssociationKind, key: &str) -> usize {
        let mut touched = 0;
        for test in &mut self.tests {
            if remove_first(test.values_mut(kind), key) {
                touched += 1;
            }
        }
        if touched > 0 {
            log::debug!("Removed '{}' from {} test(s)", key, touched);
        }
        touched
    }

    /// Renames a requirement and every requirement derived from it.
    ///
    /// Requirements whose id starts with `old` get that leading prefix
    /// replaced by `new` (renaming `R1` to `R1.x` turns `R1.2` into
    /// `R1.x.2`), and test references follow each rename.
    /// Returns the number of test references rewritten.
    pub fn rename_requirement(&mut self, old: &str, new: &str) -> usize {
        if old.is_empty() || old == new {
            return 0;
        }

        let mut renames = HashMap::from([(old.to_string(), new.to_string())]);
        for requirement in self.requirements() {
            if let Some(rest) = requirement.id.strip_prefix(old) {
                renames.insert(requirement.id.clone(), format!("{}{}", new, rest));
            }
        }

        for rdd in &mut self.rdds {
            for requirement in &mut rdd.requirements {
                if let Some(renamed) = renames.get(&requirement.id) {
                    requirement.id = renamed.clone();
                }
            }
        }

        self.rename_references(AssociationKind::Requirements, &renames)
    }

    /// Renames every record with key `old` and the test references to it
    pub fn rename_record<R: KeyedRecord>(&mut self, old: &str, new: &str) -> usize {
        if old == new {
            return 0;
        }
        for record in R::collection_mut(self).iter_mut() {
            if record.key() == old {
                record.set_key(new.to_string());
            }
        }
        self.propagate_rename(R::ASSOCIATION, old, new)
    }

    /// Applies an edited requirement, propagating an id change
    pub fn edit_requirement(&mut self, release: &str, old_id: &str, edited: Requirement) -> Result<()> {
        edited.validate()?;
        let requirement = self
            .find_rdd_mut(release)
            .and_then(|rdd| rdd.requirements.iter_mut().find(|r| r.id == old_id))
            .ok_or_else(|| EngineError::NotFound {
                kind: EntityKind::Requirement,
                key: old_id.to_string(),
            })?;
        requirement.description = edited.description;
        self.rename_requirement(old_id, &edited.id);
        Ok(())
    }

    /// Applies an edited record, propagating a key change
    pub fn edit_record<R: KeyedRecord>(&mut self, old_key: &str, edited: R) -> Result<()> {
        edited.validate()?;
        let record = R::collection_mut(self)
            .iter_mut()
            .find(|r| r.key() == old_key)
            .ok_or_else(|| EngineError::NotFound {
                kind: R::KIND,
                key: old_key.to_string(),
            })?;
        record.set_location(edited.location().to_string());
        self.rename_record::<R>(old_key, edited.key());
        Ok(())
    }

    /// Updates an RDD's release and location; its requirements are kept
    pub fn edit_rdd(&mut self, release: &str, edited: Rdd) -> Result<()> {
        edited.validate()?;
        if edited.release != release {
            self.ensure_release_free(&edited.release)?;
        }
        let rdd = self.find_rdd_mut(release).ok_or_else(|| EngineError::NotFound {
            kind: EntityKind::Rdd,
            key: release.to_string(),
        })?;
        rdd.release = edited.release;
        rdd.location = edited.location;
        Ok(())
    }

    /// Updates a test's id and release; associations are kept
    pub fn edit_test(&mut self, old_id: &str, edited: Test) -> Result<()> {
        edited.validate()?;
        let test = self
            .tests
            .iter_mut()
            .find(|t| t.id == old_id)
            .ok_or_else(|| EngineError::NotFound {
                kind: EntityKind::Test,
                key: old_id.to_string(),
            })?;
        test.id = edited.id;
        test.release = edited.release;
        Ok(())
    }

    /// Removes a requirement from its RDD and from every test
    pub fn remove_requirement(&mut self, release: &str, id: &str) -> Option<Requirement> {
        let rdd = self.find_rdd_mut(release)?;
        let index = rdd.requirements.iter().position(|r| r.id == id)?;
        let removed = rdd.requirements.remove(index);
        self.cascade_remove(AssociationKind::Requirements, &removed.id);
        Some(removed)
    }

    /// Removes an RDD together with its requirements and their test references
    pub fn remove_rdd(&mut self, release: &str) -> Option<Rdd> {
        let index = self.rdds.iter().position(|r| r.release == release)?;
        let removed = self.rdds.remove(index);
        for requirement in &removed.requirements {
            self.cascade_remove(AssociationKind::Requirements, &requirement.id);
        }
        Some(removed)
    }

    /// Removes the first record with `key` and its test references
    pub fn remove_record<R: KeyedRecord>(&mut self, key: &str) -> Option<R> {
        let records = R::collection_mut(self);
        let index = records.iter().position(|r| r.key() == key)?;
        let removed = records.remove(index);
        self.cascade_remove(R::ASSOCIATION, key);
        Some(removed)
    }

    pub fn remove_test(&mut self, id: &str) -> Option<Test> {
        let index = self.tests.iter().position(|t| t.id == id)?;
        Some(self.tests.remove(index))
    }

    /// Drops every test reference that no longer names an existing entity.
    ///
    /// Runs before every save. Returns the number of references pruned.
    pub fn sanitize(&mut self) -> usize {
        let mut pruned = 0;
        for kind in AssociationKind::ALL {
            let known = self.known_keys(kind);
            for test in &mut self.tests {
                let values = test.values_mut(kind);
                let before = values.len();
                values.retain(|v| known.contains(v));
                pruned += before - values.len();
            }
        }
        if pruned > 0 {
            log::info!("Pruned {} dangling reference(s) before save", pruned);
        }
        pruned
    }
}
