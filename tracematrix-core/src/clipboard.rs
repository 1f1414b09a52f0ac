use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{EngineError, Result};
use crate::models::{AssociationKind, Test};

/// Session-wide staging area for whole association lists.
///
/// There is one slot per association kind. Copying takes a snapshot of the
/// source list, so later edits to the source are not seen by a paste.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagClipboard {
    #[serde(default)]
    slots: BTreeMap<AssociationKind, Vec<String>>,
}

impl TagClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages the source test's list for `kind`, replacing what was staged
    pub fn copy(&mut self, kind: AssociationKind, source: &Test) -> usize {
        let values = source.values(kind).clone();
        let count = values.len();
        self.slots.insert(kind, values);
        count
    }

    pub fn staged(&self, kind: AssociationKind) -> &[String] {
        self.slots.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Paste needs a chosen kind with something staged for it
    pub fn can_paste(&self, kind: Option<AssociationKind>) -> bool {
        kind.map(|k| !self.staged(k).is_empty()).unwrap_or(false)
    }

    /// Merges the staged list into the target's list as a set union.
    ///
    /// The target keeps its existing order; staged values it lacks are
    /// appended. Returns the number of values added.
    pub fn paste(&self, kind: Option<AssociationKind>, target: &mut Test) -> Result<usize> {
        let kind = kind.ok_or(EngineError::NoKindSelected)?;
        let staged = self.staged(kind);
        if staged.is_empty() {
            return Err(EngineError::NothingStaged(kind));
        }

        let values = target.values_mut(kind);
        let mut merged: Vec<String> = Vec::with_capacity(values.len() + staged.len());
        for value in values.iter().chain(staged.iter()) {
            if !merged.contains(value) {
                merged.push(value.clone());
            }
        }
        let before = values.len();
        *values = merged;
        Ok(values.len().saturating_sub(before))
    }

    /// Empties the target's list for `kind`; returns how many values were removed
    pub fn clear(kind: AssociationKind, target: &mut Test) -> usize {
        let values = target.values_mut(kind);
        let removed = values.len();
        values.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn test_with(id: &str, requirements: &[&str]) -> Test {
        let mut test = Test::new(id);
        test.requirement_ids = requirements.iter().map(|s| s.to_string()).collect();
        test
    }

    #[test]
    fn test_paste_is_set_union() {
        let x = test_with("X", &["A", "B"]);
        let mut y = test_with("Y", &["B", "C"]);

        let mut clipboard = TagClipboard::new();
        clipboard.copy(AssociationKind::Requirements, &x);
        let added = clipboard
            .paste(Some(AssociationKind::Requirements), &mut y)
            .unwrap();

        assert_eq!(added, 1);
        let result: HashSet<&str> = y.requirement_ids.iter().map(String::as_str).collect();
        assert_eq!(result, HashSet::from(["A", "B", "C"]));
        assert_eq!(y.requirement_ids.len(), 3);
    }

    #[test]
    fn test_copy_is_a_snapshot() {
        let mut x = test_with("X", &["A"]);
        let mut y = test_with("Y", &[]);

        let mut clipboard = TagClipboard::new();
        clipboard.copy(AssociationKind::Requirements, &x);
        x.requirement_ids.push("Z".into());

        clipboard
            .paste(Some(AssociationKind::Requirements), &mut y)
            .unwrap();
        assert_eq!(y.requirement_ids, vec!["A"]);
    }

    #[test]
    fn test_slots_are_per_kind() {
        let mut x = test_with("X", &["R1"]);
        x.features.push("F1".into());
        let mut y = test_with("Y", &[]);

        let mut clipboard = TagClipboard::new();
        clipboard.copy(AssociationKind::Features, &x);

        assert!(clipboard.can_paste(Some(AssociationKind::Features)));
        assert!(!clipboard.can_paste(Some(AssociationKind::Requirements)));
        assert!(!clipboard.can_paste(None));

        clipboard.paste(Some(AssociationKind::Features), &mut y).unwrap();
        assert_eq!(y.features, vec!["F1"]);
        assert!(y.requirement_ids.is_empty());
    }

    #[test]
    fn test_paste_preconditions() {
        let mut y = test_with("Y", &["B"]);
        let mut clipboard = TagClipboard::new();

        assert!(matches!(
            clipboard.paste(None, &mut y),
            Err(EngineError::NoKindSelected)
        ));
        assert!(matches!(
            clipboard.paste(Some(AssociationKind::Designs), &mut y),
            Err(EngineError::NothingStaged(AssociationKind::Designs))
        ));

        // Copying an empty list leaves nothing to paste
        clipboard.copy(AssociationKind::Designs, &Test::new("empty"));
        assert!(!clipboard.can_paste(Some(AssociationKind::Designs)));
        assert_eq!(y.requirement_ids, vec!["B"]);
    }

    #[test]
    fn test_clear_empties_one_list() {
        let mut y = test_with("Y", &["A", "B"]);
        y.design_ids.push("D1".into());

        assert_eq!(TagClipboard::clear(AssociationKind::Requirements, &mut y), 2);
        assert!(y.requirement_ids.is_empty());
        assert_eq!(y.design_ids, vec!["D1"]);
    }

    #[test]
    fn test_clipboard_survives_json_round_trip() {
        let mut clipboard = TagClipboard::new();
        clipboard.copy(AssociationKind::UserStories, &{
            let mut t = Test::new("1");
            t.user_stories.push("US1".into());
            t
        });

        let json = serde_json::to_string(&clipboard).unwrap();
        let restored: TagClipboard = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.staged(AssociationKind::UserStories), ["US1".to_string()]);
    }
}
