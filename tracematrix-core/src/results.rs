//! Import of test ids from XML test-result reports.
//!
//! Reports tag each executed test with a `<property value="Id_<n>"/>`
//! element; every such value names a test.

use crate::error::Result;
use crate::models::{Test, TestMetadata};

pub const RESULT_ID_PREFIX: &str = "Id_";

/// Tests created by a result import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Ids of the created tests, in report order
    pub added: Vec<String>,
}

impl ImportSummary {
    pub fn count(&self) -> usize {
        self.added.len()
    }

    pub fn message(&self) -> String {
        format!("Added {} new tests from XML", self.count())
    }
}

/// Test ids named by `property/@value` attributes starting with `Id_`,
/// in document order, with the prefix stripped
pub fn extract_test_ids(xml: &str) -> Result<Vec<String>> {
    let doc = roxmltree::Document::parse(xml)?;
    let ids = doc
        .descendants()
        .filter(|node| node.has_tag_name("property"))
        .filter_map(|node| node.attribute("value"))
        .filter_map(|value| value.strip_prefix(RESULT_ID_PREFIX))
        .map(str::to_string)
        .collect();
    Ok(ids)
}

impl TestMetadata {
    /// Adds a test for every id in the report that is not already known.
    ///
    /// New tests go to the front of the list; existing tests are never touched.
    pub fn import_test_results(&mut self, xml: &str) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        for id in extract_test_ids(xml)? {
            if self.find_test(&id).is_some() {
                continue;
            }
            self.tests.insert(0, Test::new(id.clone()));
            summary.added.push(id);
        }
        log::info!("{}", summary.message());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<testsuites>
  <testsuite name="Accounts">
    <testcase name="Login works">
      <properties>
        <property name="tag" value="Id_1"/>
        <property name="category" value="smoke"/>
      </properties>
    </testcase>
    <testcase name="Logout works">
      <properties>
        <property name="tag" value="Id_2"/>
      </properties>
    </testcase>
    <testcase name="Login works again">
      <properties>
        <property name="tag" value="Id_1"/>
      </properties>
    </testcase>
  </testsuite>
</testsuites>"#;

    #[test]
    fn test_extract_ids_in_document_order() {
        assert_eq!(extract_test_ids(REPORT).unwrap(), vec!["1", "2", "1"]);
    }

    #[test]
    fn test_import_is_additive() {
        let mut metadata = TestMetadata::new();
        metadata.get_test("1").requirement_ids.push("R1".into());

        let summary = metadata.import_test_results(REPORT).unwrap();

        assert_eq!(summary.added, vec!["2"]);
        assert_eq!(summary.message(), "Added 1 new tests from XML");
        assert_eq!(metadata.tests.len(), 2);
        assert_eq!(metadata.tests[0].id, "2");
        assert_eq!(metadata.find_test("1").unwrap().requirement_ids, vec!["R1"]);
    }

    #[test]
    fn test_import_prepends_each_new_test() {
        let mut metadata = TestMetadata::new();
        metadata.get_test("existing");

        let summary = metadata.import_test_results(REPORT).unwrap();
        assert_eq!(summary.count(), 2);
        let ids: Vec<&str> = metadata.tests.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "existing"]);
    }

    #[test]
    fn test_import_ignores_non_matching_values() {
        let xml = r#"<r><property value="id_1"/><item value="Id_2"/><property value="XId_3"/></r>"#;
        let mut metadata = TestMetadata::new();
        let summary = metadata.import_test_results(xml).unwrap();
        assert_eq!(summary.count(), 0);
        assert!(metadata.tests.is_empty());
    }

    #[test]
    fn test_import_rejects_malformed_xml() {
        let mut metadata = TestMetadata::new();
        let err = metadata.import_test_results("<testsuite><property").unwrap_err();
        assert!(matches!(err, EngineError::Xml(_)));
        assert!(metadata.tests.is_empty());
    }
}
