use anyhow::Result;
use inquire::{Confirm, Select, Text};
use std::path::PathBuf;

use tracematrix_core::{Rdd, Requirement, Test};

/// Asks before a destructive removal; `--yes` skips the question
pub fn confirm_removal(what: &str, skip_confirm: bool) -> Result<bool> {
    if skip_confirm {
        return Ok(true);
    }
    let confirmed = Confirm::new(&format!("Are you sure you want to remove {}?", what))
        .with_default(false)
        .prompt()?;
    Ok(confirmed)
}

pub fn prompt_new_rdd() -> Result<Rdd> {
    let release = Text::new("Release:").prompt()?;
    let location = Text::new("Location:").prompt()?;
    Ok(Rdd::new(release, location))
}

pub fn prompt_new_requirement() -> Result<Requirement> {
    let id = Text::new("Id:").prompt()?;

    // Use the Editor type for multiline input
    let description = inquire::Editor::new("Description:").prompt()?;

    Ok(Requirement::new(id, description.trim_end()))
}

/// Prompts for the key and location of a design, feature or user story
pub fn prompt_new_record(label: &str) -> Result<(String, String)> {
    let key = Text::new(&format!("{} id:", label)).prompt()?;
    let location = Text::new("Location:").prompt()?;
    Ok((key, location))
}

/// Prompts for a test id and one of the known releases
pub fn prompt_new_test(releases: Vec<String>) -> Result<Test> {
    let id = Text::new("Test id:").prompt()?;
    let release = if releases.is_empty() {
        Text::new("Release:").prompt()?
    } else {
        Select::new("Release:", releases).prompt()?
    };

    let mut test = Test::new(id);
    test.release = Some(release);
    Ok(test)
}

/// Prompts the user for document registration details
pub fn prompt_register_document() -> Result<(String, PathBuf, String, bool)> {
    let name = Text::new("Document name:").prompt()?;
    let path = PathBuf::from(Text::new("Path to metadata file:").prompt()?);
    let description = Text::new("Description:").prompt()?;
    let default = Confirm::new("Set as default document?").prompt()?;

    Ok((name, path, description, default))
}
