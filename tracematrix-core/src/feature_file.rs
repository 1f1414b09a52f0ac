//! Reads `(test id, scenario name)` pairs out of Gherkin feature files.
//!
//! Only two kinds of line matter: an `@Id_<n>` tag and the `Scenario:` line
//! it belongs to. Everything else in the file is ignored.

use crate::error::{EngineError, Result};
use crate::models::Scenario;

pub const ID_TAG: &str = "@Id_";
pub const SCENARIO_TAG: &str = "Scenario:";

/// Removes the first occurrence of `tag` and trims the rest
fn strip_tag(line: &str, tag: &str) -> String {
    line.replacen(tag, "", 1).trim().to_string()
}

/// Parses a feature file into scenarios, in file order.
///
/// Tag lines are paired strictly by position: the first of each pair is
/// read as the id and the second as the name, even if the tags appear in
/// the wrong order. An odd number of tag lines fails the whole parse.
pub fn parse_feature_file(content: &str) -> Result<Vec<Scenario>> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(ID_TAG) || line.starts_with(SCENARIO_TAG))
        .collect();

    if lines.len() % 2 != 0 {
        log::warn!("Feature file has {} unpaired tag lines", lines.len());
        return Err(EngineError::UnmatchedTags {
            tag_lines: lines.len(),
        });
    }

    let scenarios = lines
        .chunks_exact(2)
        .map(|pair| {
            let (id_line, name_line) = (pair[0], pair[1]);
            if !id_line.starts_with(ID_TAG) || !name_line.starts_with(SCENARIO_TAG) {
                log::warn!(
                    "Misaligned tags paired positionally: '{}' / '{}'",
                    id_line,
                    name_line
                );
            }
            Scenario {
                id: strip_tag(id_line, ID_TAG),
                name: strip_tag(name_line, SCENARIO_TAG),
            }
        })
        .collect();

    Ok(scenarios)
}
