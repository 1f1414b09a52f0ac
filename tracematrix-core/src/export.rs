use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::models::{AssociationKind, Design, Feature, KeyedRecord, Test, TestMetadata, UserStory};

/// The flattened tables a document can be exported as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvView {
    Requirements,
    Designs,
    Features,
    UserStories,
    Tests,
}

impl CsvView {
    pub const ALL: [CsvView; 5] = [
        CsvView::Requirements,
        CsvView::Designs,
        CsvView::Features,
        CsvView::UserStories,
        CsvView::Tests,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tests" | "test" => Some(CsvView::Tests),
            other => AssociationKind::parse(other).map(Self::from),
        }
    }

    /// Default file name for this view
    pub fn file_name(&self) -> &'static str {
        match self {
            CsvView::Requirements => "requirements.csv",
            CsvView::Designs => "designs.csv",
            CsvView::Features => "features.csv",
            CsvView::UserStories => "user-stories.csv",
            CsvView::Tests => "tests.csv",
        }
    }
}

impl From<AssociationKind> for CsvView {
    fn from(kind: AssociationKind) -> Self {
        match kind {
            AssociationKind::Requirements => CsvView::Requirements,
            AssociationKind::Designs => CsvView::Designs,
            AssociationKind::Features => CsvView::Features,
            AssociationKind::UserStories => CsvView::UserStories,
        }
    }
}

/// Number of tests whose list of `kind` contains `key`
pub fn usage_count(metadata: &TestMetadata, kind: AssociationKind, key: &str) -> usize {
    metadata
        .tests
        .iter()
        .filter(|t| t.values(kind).iter().any(|v| v == key))
        .count()
}

fn write_records<R: KeyedRecord, W: Write>(
    metadata: &TestMetadata,
    writer: &mut csv::Writer<W>,
) -> Result<()> {
    writer.write_record(["Id", "Location", "Used in tests"])?;
    for record in R::collection(metadata) {
        let used = usage_count(metadata, R::ASSOCIATION, record.key());
        writer.write_record([record.key(), record.location(), used.to_string().as_str()])?;
    }
    Ok(())
}

fn test_row(test: &Test) -> [String; 6] {
    [
        test.id.clone(),
        test.release.clone().unwrap_or_default(),
        test.requirement_ids.join(", "),
        test.design_ids.join(", "),
        test.features.join(", "),
        test.user_stories.join(", "),
    ]
}

/// Writes one view of the document as CSV
pub fn write_csv<W: Write>(metadata: &TestMetadata, view: CsvView, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    match view {
        CsvView::Requirements => {
            writer.write_record(["Release", "Id", "Description", "Used in tests"])?;
            for rdd in &metadata.rdds {
                for requirement in &rdd.requirements {
                    let used =
                        usage_count(metadata, AssociationKind::Requirements, &requirement.id);
                    writer.write_record([
                        rdd.release.as_str(),
                        requirement.id.as_str(),
                        requirement.description.as_str(),
                        used.to_string().as_str(),
                    ])?;
                }
            }
        }
        CsvView::Designs => write_records::<Design, _>(metadata, &mut writer)?,
        CsvView::Features => write_records::<Feature, _>(metadata, &mut writer)?,
        CsvView::UserStories => write_records::<UserStory, _>(metadata, &mut writer)?,
        CsvView::Tests => {
            writer.write_record([
                "Id",
                "Release",
                "Requirements",
                "Designs",
                "Features",
                "User Stories",
            ])?;
            for test in &metadata.tests {
                writer.write_record(test_row(test))?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Export one view to a CSV file
pub fn export_csv(metadata: &TestMetadata, view: CsvView, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create export file: {:?}", output_path))?;
    write_csv(metadata, view, file)?;
    log::info!("Exported {:?} to {:?}", view, output_path);
    Ok(())
}

/// Export the sanitized document as pretty JSON.
///
/// The loaded document is left as it is; only the written copy is pruned.
/// Returns the number of dangling references left out.
pub fn export_json(metadata: &TestMetadata, output_path: &Path) -> Result<usize> {
    let mut copy = metadata.clone();
    let pruned = copy.sanitize();
    let json = serde_json::to_string_pretty(&copy)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write export file: {:?}", output_path))?;
    log::info!("Exported JSON to {:?}", output_path);
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rdd, Requirement};
    use tempfile::tempdir;

    fn sample() -> TestMetadata {
        let mut metadata = TestMetadata::new();
        let mut rdd = Rdd::new("1.0", "rdd-1.0");
        rdd.requirements.push(Requirement::new("R1", "Login, with password"));
        rdd.requirements.push(Requirement::new("R2", "Logout"));
        metadata.rdds.push(rdd);
        metadata.designs.push(Design::new("D1".into(), "designs/d1.md".into()));

        let test = metadata.get_test("1");
        test.release = Some("1.0".into());
        test.requirement_ids = vec!["R1".into(), "R2".into()];
        test.design_ids = vec!["D1".into()];
        metadata.get_test("2").requirement_ids = vec!["R1".into()];
        metadata
    }

    fn render(metadata: &TestMetadata, view: CsvView) -> String {
        let mut out = Vec::new();
        write_csv(metadata, view, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_view() {
        assert_eq!(CsvView::parse("tests"), Some(CsvView::Tests));
        assert_eq!(CsvView::parse("Stories"), Some(CsvView::UserStories));
        assert_eq!(CsvView::parse("req"), Some(CsvView::Requirements));
        assert_eq!(CsvView::parse("rdds"), None);
    }

    #[test]
    fn test_requirements_view_counts_usage() {
        let text = render(&sample(), CsvView::Requirements);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Release,Id,Description,Used in tests");
        assert_eq!(lines[1], "1.0,R1,\"Login, with password\",2");
        assert_eq!(lines[2], "1.0,R2,Logout,1");
    }

    #[test]
    fn test_record_view() {
        let text = render(&sample(), CsvView::Designs);
        assert_eq!(text, "Id,Location,Used in tests\nD1,designs/d1.md,1\n");

        let empty = render(&sample(), CsvView::Features);
        assert_eq!(empty, "Id,Location,Used in tests\n");
    }

    #[test]
    fn test_tests_view_joins_lists() {
        let text = render(&sample(), CsvView::Tests);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Id,Release,Requirements,Designs,Features,User Stories"
        );
        assert_eq!(lines[1], "1,1.0,\"R1, R2\",D1,,");
        assert_eq!(lines[2], "2,,R1,,,");
    }

    #[test]
    fn test_export_json_prunes_copy_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        let mut metadata = sample();
        metadata.get_test("2").design_ids.push("D404".into());

        assert_eq!(export_json(&metadata, &path).unwrap(), 1);
        assert_eq!(metadata.find_test("2").unwrap().design_ids, vec!["D404"]);

        let written: TestMetadata =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.find_test("2").unwrap().design_ids.is_empty());
    }

    #[test]
    fn test_export_csv_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CsvView::Tests.file_name());
        export_csv(&sample(), CsvView::Tests, &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("Id,Release"));
    }
}
