mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use tracematrix_core::export::usage_count;
use tracematrix_core::{
    determine_metadata_path, export, get_config_path, AssociationKind, Config, CsvView, Design,
    Document, EngineError, EntityKind, Feature, KeyedRecord, Rdd, ReadSource, Requirement,
    SessionBackup, SessionStore, Storage, Test, UserStory,
};

use crate::cli::{
    BackupCommand, ClipCommand, Cli, Command, ConfigCommand, RddCommand, RecordCommand,
    ReqCommand, ScenarioCommand, TagCommand, TestCommand,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Config(config_cmd) => return handle_config_command(config_cmd, &cli),
        Command::Init => return init_document(&cli),
        _ => {}
    }

    let metadata_path = determine_metadata_path(cli.file.as_deref(), cli.doc.as_deref())?;
    log::debug!("Using metadata file {:?}", metadata_path);
    let storage = Storage::new(&metadata_path);

    let config = Config::load_or_default(get_config_path()?)?;
    let state_dir = config.state_dir()?;
    let sessions = SessionStore::new(&state_dir);
    let backup = SessionBackup::new(&state_dir);

    let mut document = Document::new().with_backup(backup.clone());
    document.restore_session(sessions.load()?);

    let outcome = match &cli.command {
        Command::Backup(backup_cmd) => {
            handle_backup_command(backup_cmd, &mut document, &storage, &backup)
        }
        command => run_command(command, &mut document, &storage),
    };

    // Session state is kept even when the command failed: a rejected
    // feature file clears the scenario list.
    sessions.save(&document.session_state())?;
    outcome
}

fn run_command(command: &Command, document: &mut Document, storage: &Storage) -> Result<()> {
    document.open(storage)?;
    let start = document.revision();

    let outcome = dispatch(command, document);

    if document.revision() != start {
        let report = document.save(storage)?;
        if report.pruned > 0 {
            println!(
                "{} Dropped {} dangling reference(s) on save.",
                "!".yellow(),
                report.pruned
            );
        }
        print_duplicates(document);
    }
    outcome
}

fn dispatch(command: &Command, document: &mut Document) -> Result<()> {
    match command {
        Command::Check => check_document(document),
        Command::Status => show_status(document),
        Command::Rdd(cmd) => handle_rdd_command(cmd, document),
        Command::Req(cmd) => handle_req_command(cmd, document),
        Command::Design(cmd) => handle_record_command::<Design>(cmd, document),
        Command::Feature(cmd) => handle_record_command::<Feature>(cmd, document),
        Command::Story(cmd) => handle_record_command::<UserStory>(cmd, document),
        Command::Test(cmd) => handle_test_command(cmd, document),
        Command::Tag(cmd) => handle_tag_command(cmd, document),
        Command::Clip(cmd) => handle_clip_command(cmd, document),
        Command::Scenarios(cmd) => handle_scenario_command(cmd, document),
        Command::Import { path } => import_results(document, path),
        Command::Export {
            format,
            view,
            output,
        } => handle_export_command(document, format, view.as_deref(), output.as_deref()),
        Command::Init | Command::Config(_) | Command::Backup(_) => Ok(()),
    }
}

fn print_duplicates(document: &Document) {
    for entry in &document.duplicates().entries {
        println!("{} {}", "!".yellow(), entry.to_string().yellow());
    }
}

fn init_document(cli: &Cli) -> Result<()> {
    let path = match (&cli.file, &cli.doc) {
        (Some(file), _) => file.clone(),
        (None, Some(_)) => determine_metadata_path(None, cli.doc.as_deref())?,
        (None, None) => PathBuf::from(tracematrix_core::DEFAULT_METADATA_FILENAME),
    };
    Storage::new(&path).init()?;
    println!("{} Created {}", "✓".green(), path.display());
    Ok(())
}

fn check_document(document: &Document) -> Result<()> {
    let metadata = document.metadata()?;

    let mut sanitized = metadata.clone();
    let dangling = sanitized.sanitize();

    if document.duplicates().is_empty() && dangling == 0 {
        println!("{} No problems found.", "✓".green());
        return Ok(());
    }

    print_duplicates(document);
    if dangling > 0 {
        println!(
            "{} {} dangling reference(s) will be dropped on the next save.",
            "!".yellow(),
            dangling
        );
    }
    Ok(())
}

fn show_status(document: &Document) -> Result<()> {
    let metadata = document.metadata()?;

    println!("{:<14} {}", "Metadata:".bold(), document.metadata_status());
    println!("{:<14} {}", "Feature file:".bold(), document.feature_status());
    println!(
        "{:<14} {}",
        "RDD:".bold(),
        document.selected_rdd().unwrap_or("none selected")
    );
    println!();
    println!("  Tests:        {}", metadata.tests.len());
    println!("  RDDs:         {}", metadata.rdds.len());
    println!("  Requirements: {}", metadata.requirements().count());
    println!("  Designs:      {}", metadata.designs.len());
    println!("  Features:     {}", metadata.features.len());
    println!("  User stories: {}", metadata.user_stories.len());

    let staged: Vec<String> = AssociationKind::ALL
        .iter()
        .filter(|kind| !document.clipboard().staged(**kind).is_empty())
        .map(|kind| format!("{} ({})", kind, document.clipboard().staged(*kind).len()))
        .collect();
    if !staged.is_empty() {
        println!();
        println!("{:<14} {}", "Clipboard:".bold(), staged.join(", "));
    }

    if !document.duplicates().is_empty() {
        println!();
        print_duplicates(document);
    }
    Ok(())
}

// =============================================================================
// RDDs and requirements
// =============================================================================

fn handle_rdd_command(cmd: &RddCommand, document: &mut Document) -> Result<()> {
    match cmd {
        RddCommand::List => {
            let metadata = document.metadata()?;
            if metadata.rdds.is_empty() {
                println!("{}", "No RDDs found.".yellow());
                return Ok(());
            }
            println!("  {:<12} | {:<40} | {}", "Release", "Location", "Requirements");
            println!("{}", "-".repeat(72));
            for rdd in &metadata.rdds {
                let marker = if document.selected_rdd() == Some(rdd.release.as_str()) {
                    "*".green()
                } else {
                    " ".normal()
                };
                println!(
                    "{} {:<12} | {:<40} | {}",
                    marker,
                    rdd.release,
                    rdd.location,
                    rdd.requirements.len()
                );
            }
        }
        RddCommand::Add {
            release,
            location,
            interactive,
        } => {
            let rdd = if *interactive || (release.is_none() && location.is_none()) {
                prompts::prompt_new_rdd()?
            } else {
                Rdd::new(
                    release.clone().unwrap_or_default(),
                    location.clone().unwrap_or_default(),
                )
            };
            let name = rdd.release.clone();
            document.add_rdd(rdd)?;
            println!("{} RDD '{}' added and selected.", "✓".green(), name);
        }
        RddCommand::Select { release } => {
            document.select_rdd(release)?;
            println!("{} RDD '{}' selected.", "✓".green(), release);
        }
        RddCommand::Show { release } => {
            let release = match release {
                Some(release) => release.clone(),
                None => document
                    .selected_rdd()
                    .ok_or(EngineError::NoRddSelected)?
                    .to_string(),
            };
            let rdd = document
                .metadata()?
                .find_rdd(&release)
                .ok_or_else(|| EngineError::NotFound {
                    kind: EntityKind::Rdd,
                    key: release.clone(),
                })?;
            println!("{} {}", "Release:".bold(), rdd.release);
            println!("{} {}", "Location:".bold(), rdd.location);
            println!();
            print_requirements(document, rdd.requirements.iter().map(|r| (&rdd.release, r)))?;
        }
        RddCommand::Edit { release, location } => {
            let selected = document
                .selected_rdd()
                .ok_or(EngineError::NoRddSelected)?
                .to_string();
            let current = document
                .metadata()?
                .find_rdd(&selected)
                .ok_or_else(|| EngineError::NotFound {
                    kind: EntityKind::Rdd,
                    key: selected.clone(),
                })?;
            let edited = Rdd::new(
                release.clone().unwrap_or_else(|| current.release.clone()),
                location.clone().unwrap_or_else(|| current.location.clone()),
            );
            document.edit_rdd(edited)?;
            println!("{} RDD updated.", "✓".green());
        }
        RddCommand::Remove { yes } => {
            let selected = document
                .selected_rdd()
                .ok_or(EngineError::NoRddSelected)?
                .to_string();
            let what = format!("RDD '{}' and all of its requirements", selected);
            if !prompts::confirm_removal(&what, *yes)? {
                println!("{}", "Removal cancelled.".yellow());
                return Ok(());
            }
            let removed = document.remove_rdd()?;
            println!(
                "{} RDD '{}' removed with {} requirement(s).",
                "✓".green(),
                removed.release,
                removed.requirements.len()
            );
        }
    }
    Ok(())
}

fn print_requirements<'a, I>(document: &Document, requirements: I) -> Result<()>
where
    I: Iterator<Item = (&'a String, &'a Requirement)>,
{
    let metadata = document.metadata()?;
    let rows: Vec<_> = requirements.collect();
    if rows.is_empty() {
        println!("{}", "No requirements found.".yellow());
        return Ok(());
    }
    println!(
        "{:<10} | {:<12} | {:<50} | {}",
        "Release", "Id", "Description", "Tests"
    );
    println!("{}", "-".repeat(90));
    for (release, requirement) in rows {
        let used = usage_count(metadata, AssociationKind::Requirements, &requirement.id);
        println!(
            "{:<10} | {:<12} | {:<50} | {}",
            release,
            requirement.id,
            requirement.description.lines().next().unwrap_or_default(),
            used
        );
    }
    Ok(())
}

fn handle_req_command(cmd: &ReqCommand, document: &mut Document) -> Result<()> {
    match cmd {
        ReqCommand::List { all } => {
            let metadata = document.metadata()?;
            if *all {
                let rows = metadata
                    .rdds
                    .iter()
                    .flat_map(|rdd| rdd.requirements.iter().map(move |r| (&rdd.release, r)));
                print_requirements(document, rows)?;
            } else {
                let selected = document.selected_rdd().ok_or(EngineError::NoRddSelected)?;
                let rdd = metadata.find_rdd(selected).ok_or_else(|| EngineError::NotFound {
                    kind: EntityKind::Rdd,
                    key: selected.to_string(),
                })?;
                print_requirements(document, rdd.requirements.iter().map(|r| (&rdd.release, r)))?;
            }
        }
        ReqCommand::Add {
            id,
            description,
            interactive,
        } => {
            let requirement = if *interactive || (id.is_none() && description.is_none()) {
                // Fail before prompting when nothing can be added
                document.metadata()?;
                document.selected_rdd().ok_or(EngineError::NoRddSelected)?;
                prompts::prompt_new_requirement()?
            } else {
                Requirement::new(
                    id.clone().unwrap_or_default(),
                    description.clone().unwrap_or_default(),
                )
            };
            let new_id = requirement.id.clone();
            document.add_requirement(requirement)?;
            println!("{} Requirement '{}' added.", "✓".green(), new_id);
        }
        ReqCommand::Edit {
            id,
            new_id,
            description,
        } => {
            let selected = document
                .selected_rdd()
                .ok_or(EngineError::NoRddSelected)?
                .to_string();
            let current = document
                .metadata()?
                .find_rdd(&selected)
                .and_then(|rdd| rdd.requirements.iter().find(|r| r.id == *id))
                .cloned()
                .ok_or_else(|| EngineError::NotFound {
                    kind: EntityKind::Requirement,
                    key: id.clone(),
                })?;
            let edited = Requirement::new(
                new_id.clone().unwrap_or(current.id),
                description.clone().unwrap_or(current.description),
            );
            document.edit_requirement(id, edited)?;
            println!("{} Requirement updated.", "✓".green());
        }
        ReqCommand::Remove { id, yes } => {
            document.selected_rdd().ok_or(EngineError::NoRddSelected)?;
            let what = format!("requirement '{}' from the RDD and every test", id);
            if !prompts::confirm_removal(&what, *yes)? {
                println!("{}", "Removal cancelled.".yellow());
                return Ok(());
            }
            let removed = document.remove_requirement(id)?;
            println!("{} Requirement '{}' removed.", "✓".green(), removed.id);
        }
    }
    Ok(())
}

// =============================================================================
// Designs, features and user stories
// =============================================================================

fn handle_record_command<R: KeyedRecord>(cmd: &RecordCommand, document: &mut Document) -> Result<()> {
    match cmd {
        RecordCommand::List => {
            let metadata = document.metadata()?;
            let records = R::collection(metadata);
            if records.is_empty() {
                println!("{}", format!("No {} found.", R::KIND.plural()).yellow());
                return Ok(());
            }
            println!("{:<16} | {:<50} | {}", "Id", "Location", "Tests");
            println!("{}", "-".repeat(80));
            for record in records {
                println!(
                    "{:<16} | {:<50} | {}",
                    record.key(),
                    record.location(),
                    usage_count(metadata, R::ASSOCIATION, record.key())
                );
            }
        }
        RecordCommand::Add {
            id,
            location,
            interactive,
        } => {
            let (key, location) = if *interactive || (id.is_none() && location.is_none()) {
                prompts::prompt_new_record(&R::KIND.to_string())?
            } else {
                (
                    id.clone().unwrap_or_default(),
                    location.clone().unwrap_or_default(),
                )
            };
            document.add_record(R::new(key.clone(), location))?;
            println!("{} {} '{}' added.", "✓".green(), R::KIND, key);
        }
        RecordCommand::Edit {
            id,
            new_id,
            location,
        } => {
            let current = document
                .metadata()?
                .find_record::<R>(id)
                .ok_or_else(|| EngineError::NotFound {
                    kind: R::KIND,
                    key: id.clone(),
                })?;
            let edited = R::new(
                new_id.clone().unwrap_or_else(|| current.key().to_string()),
                location
                    .clone()
                    .unwrap_or_else(|| current.location().to_string()),
            );
            document.edit_record(id, edited)?;
            println!("{} {} updated.", "✓".green(), R::KIND);
        }
        RecordCommand::Remove { id, yes } => {
            let what = format!("{} '{}' and every test reference to it", R::KIND, id);
            if !prompts::confirm_removal(&what, *yes)? {
                println!("{}", "Removal cancelled.".yellow());
                return Ok(());
            }
            let removed = document.remove_record::<R>(id)?;
            println!("{} {} '{}' removed.", "✓".green(), R::KIND, removed.key());
        }
    }
    Ok(())
}

// =============================================================================
// Tests and tags
// =============================================================================

fn print_test(test: &Test) {
    println!("{} {}", "Test:".bold(), test.id);
    println!(
        "{} {}",
        "Release:".bold(),
        test.release.as_deref().unwrap_or("-")
    );
    for kind in AssociationKind::ALL {
        println!("  {:<14} {}", format!("{}:", kind), test.values(kind).join(", "));
    }
}

fn handle_test_command(cmd: &TestCommand, document: &mut Document) -> Result<()> {
    match cmd {
        TestCommand::List => {
            let metadata = document.metadata()?;
            if metadata.tests.is_empty() {
                println!("{}", "No tests found.".yellow());
                return Ok(());
            }
            println!(
                "{:<12} | {:<10} | {:<24} | {:<16} | {:<16} | {}",
                "Id", "Release", "Requirements", "Designs", "Features", "User Stories"
            );
            println!("{}", "-".repeat(110));
            for test in &metadata.tests {
                println!(
                    "{:<12} | {:<10} | {:<24} | {:<16} | {:<16} | {}",
                    test.id,
                    test.release.as_deref().unwrap_or("-"),
                    test.requirement_ids.join(", "),
                    test.design_ids.join(", "),
                    test.features.join(", "),
                    test.user_stories.join(", ")
                );
            }
        }
        TestCommand::Show { id } => {
            let test = document
                .metadata()?
                .find_test(id)
                .ok_or_else(|| EngineError::NotFound {
                    kind: EntityKind::Test,
                    key: id.clone(),
                })?;
            print_test(test);
        }
        TestCommand::Add {
            id,
            release,
            interactive,
        } => {
            let test = if *interactive || (id.is_none() && release.is_none()) {
                let releases = document
                    .metadata()?
                    .rdds
                    .iter()
                    .map(|r| r.release.clone())
                    .collect();
                prompts::prompt_new_test(releases)?
            } else {
                let mut test = Test::new(id.clone().unwrap_or_default());
                test.release = release.clone();
                test
            };
            let new_id = test.id.clone();
            document.add_test(test)?;
            println!("{} Test '{}' added.", "✓".green(), new_id);
        }
        TestCommand::Edit {
            id,
            new_id,
            release,
        } => {
            let current = document
                .metadata()?
                .find_test(id)
                .ok_or_else(|| EngineError::NotFound {
                    kind: EntityKind::Test,
                    key: id.clone(),
                })?;
            let mut edited = Test::new(new_id.clone().unwrap_or_else(|| current.id.clone()));
            edited.release = release.clone().or_else(|| current.release.clone());
            document.edit_test(id, edited)?;
            println!("{} Test updated.", "✓".green());
        }
        TestCommand::Remove { id, yes } => {
            if !prompts::confirm_removal(&format!("test '{}'", id), *yes)? {
                println!("{}", "Removal cancelled.".yellow());
                return Ok(());
            }
            let removed = document.remove_test(id)?;
            println!("{} Test '{}' removed.", "✓".green(), removed.id);
        }
    }
    Ok(())
}

fn handle_tag_command(cmd: &TagCommand, document: &mut Document) -> Result<()> {
    match cmd {
        TagCommand::List { test, kind } => {
            let kinds = match kind {
                Some(kind) => vec![*kind],
                None => AssociationKind::ALL.to_vec(),
            };
            for kind in kinds {
                let values = document.values(test, kind)?;
                println!("  {:<14} {}", format!("{}:", kind), values.join(", "));
            }
        }
        TagCommand::Options { test, kind, filter } => {
            let options = document.options(test, *kind, filter.as_deref())?;
            if options.is_empty() {
                println!("{}", "No values left to add.".yellow());
            }
            for option in options {
                println!("{}", option);
            }
        }
        TagCommand::Add { test, kind, value } => match document.add_value(test, *kind, value)? {
            Some(added) => println!("{} Added '{}' to {} of test '{}'.", "✓".green(), added, kind, test),
            None => println!(
                "{} '{}' is not a value that can be added to {} of test '{}'.",
                "!".yellow(),
                value,
                kind,
                test
            ),
        },
        TagCommand::Remove { test, kind, value } => {
            if document.remove_value(test, *kind, value)? {
                println!("{} Removed '{}' from {} of test '{}'.", "✓".green(), value, kind, test);
            } else {
                println!("{} Test '{}' has no '{}' in {}.", "!".yellow(), test, value, kind);
            }
        }
    }
    Ok(())
}

fn handle_clip_command(cmd: &ClipCommand, document: &mut Document) -> Result<()> {
    match cmd {
        ClipCommand::Show => {
            for kind in AssociationKind::ALL {
                let staged = document.clipboard().staged(kind);
                if !staged.is_empty() {
                    println!("  {:<14} {}", format!("{}:", kind), staged.join(", "));
                }
            }
        }
        ClipCommand::Copy { kind, test } => {
            let count = document.copy_tags(*kind, test)?;
            println!("{} Copied {} {} value(s) from test '{}'.", "✓".green(), count, kind, test);
        }
        ClipCommand::Paste { kind, test } => {
            let added = document.paste_tags(Some(*kind), test)?;
            println!("{} Pasted {} new {} value(s) into test '{}'.", "✓".green(), added, kind, test);
        }
        ClipCommand::Clear { kind, test, yes } => {
            let what = format!("every {} value of test '{}'", kind, test);
            if !prompts::confirm_removal(&what, *yes)? {
                println!("{}", "Clear cancelled.".yellow());
                return Ok(());
            }
            let removed = document.clear_tags(*kind, test)?;
            println!("{} Cleared {} value(s).", "✓".green(), removed);
        }
    }
    Ok(())
}

// =============================================================================
// Feature files, results and export
// =============================================================================

fn handle_scenario_command(cmd: &ScenarioCommand, document: &mut Document) -> Result<()> {
    match cmd {
        ScenarioCommand::Load { path } => {
            let ticket = document.begin_read(ReadSource::FeatureFile);
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read feature file: {:?}", path))?;
            let name = path.file_name().map(|n| n.to_string_lossy().to_string());
            let count = document.apply_feature_file(ticket, name, &content)?;
            println!("{} Loaded {} scenario(s).", "✓".green(), count);
        }
        ScenarioCommand::List => {
            let rows = document.scenario_rows()?;
            if rows.is_empty() {
                println!("{}", "No scenarios loaded. Run 'tmx scenarios load <file>'.".yellow());
                return Ok(());
            }
            println!("{}", document.feature_status().bold());
            println!(
                "{:<10} | {:<36} | {:<20} | {:<14} | {:<14} | {}",
                "Test Id", "Scenario Name", "Requirements", "Designs", "User Stories", "Features"
            );
            println!("{}", "-".repeat(120));
            for (scenario, test) in rows {
                println!(
                    "{:<10} | {:<36} | {:<20} | {:<14} | {:<14} | {}",
                    scenario.id,
                    scenario.name,
                    test.requirement_ids.join(", "),
                    test.design_ids.join(", "),
                    test.user_stories.join(", "),
                    test.features.join(", ")
                );
            }
        }
    }
    Ok(())
}

fn import_results(document: &mut Document, path: &Path) -> Result<()> {
    let ticket = document.begin_read(ReadSource::TestResults);
    let xml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test results: {:?}", path))?;
    let summary = document.apply_test_results(ticket, &xml)?;
    println!("{} {}", "✓".green(), summary.message());
    Ok(())
}

fn handle_export_command(
    document: &Document,
    format: &str,
    view: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let metadata = document.metadata()?;

    match format {
        "json" => {
            let output_path = output
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("traceability.json"));
            let pruned = export::export_json(metadata, &output_path)?;
            println!("{} Exported to JSON: {}", "✓".green(), output_path.display());
            if pruned > 0 {
                println!("  Left out {} dangling reference(s)", pruned);
            }
        }
        "csv" => match view {
            Some(view) => {
                let view = CsvView::parse(view)
                    .ok_or_else(|| anyhow::anyhow!("Unknown CSV view: {}", view))?;
                let output_path = output
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from(view.file_name()));
                export::export_csv(metadata, view, &output_path)?;
                println!("{} Exported to CSV: {}", "✓".green(), output_path.display());
            }
            None => {
                let dir = output.unwrap_or_else(|| Path::new("."));
                fs::create_dir_all(dir)?;
                for view in CsvView::ALL {
                    let output_path = dir.join(view.file_name());
                    export::export_csv(metadata, view, &output_path)?;
                    println!("{} Exported to CSV: {}", "✓".green(), output_path.display());
                }
            }
        },
        _ => {
            anyhow::bail!("Unknown export format: {}. Supported formats: csv, json", format);
        }
    }

    Ok(())
}

// =============================================================================
// Backup and config
// =============================================================================

fn handle_backup_command(
    cmd: &BackupCommand,
    document: &mut Document,
    storage: &Storage,
    backup: &SessionBackup,
) -> Result<()> {
    match cmd {
        BackupCommand::Status => match backup.modified() {
            Some(modified) => println!(
                "{} Backup written {} at {}",
                "✓".green(),
                modified.format("%Y-%m-%d %H:%M:%S"),
                backup.path().display()
            ),
            None => println!("{}", "No session backup.".yellow()),
        },
        BackupCommand::Restore { yes } => {
            if !backup.exists() {
                println!("{}", "No session backup.".yellow());
                return Ok(());
            }
            let what = format!("the contents of {} with the backup", storage.path().display());
            if !prompts::confirm_removal(&what, *yes)? {
                println!("{}", "Restore cancelled.".yellow());
                return Ok(());
            }
            if document.recover_from_backup()? {
                document.save(storage)?;
                println!(
                    "{} Restored backup into {}",
                    "✓".green(),
                    storage.path().display()
                );
                print_duplicates(document);
            }
        }
        BackupCommand::Discard => {
            backup.discard()?;
            println!("{} Backup discarded.", "✓".green());
        }
    }
    Ok(())
}

fn handle_config_command(cmd: &ConfigCommand, cli: &Cli) -> Result<()> {
    let config_path = get_config_path()?;

    match cmd {
        ConfigCommand::Register {
            name,
            path,
            description,
            default,
            interactive,
        } => {
            Config::create_default(&config_path)?;
            let mut config = Config::load(&config_path)?;

            let should_be_interactive =
                *interactive || (name.is_none() && path.is_none() && description.is_none());

            let (doc_name, doc_path, doc_description, is_default) = if should_be_interactive {
                prompts::prompt_register_document()?
            } else {
                let doc_name = name
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Document name is required"))?;
                let doc_path = path
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Document path is required"))?;
                (doc_name, doc_path, description.clone().unwrap_or_default(), *default)
            };

            config.register_document(
                doc_name.clone(),
                doc_path.to_string_lossy().to_string(),
                doc_description,
            );
            if is_default {
                config.set_default_document(&doc_name)?;
            }
            config.save(&config_path)?;

            println!("{} Document '{}' registered.", "✓".green(), doc_name);
            if is_default {
                println!("{} Document '{}' set as default.", "✓".green(), doc_name);
            }
        }
        ConfigCommand::List => {
            let config = Config::load_or_default(&config_path)?;
            if config.documents.is_empty() {
                println!("{}", "No documents registered.".yellow());
                return Ok(());
            }
            for name in config.list_documents() {
                if let Some(entry) = config.get_document(name) {
                    let marker = if config.default_document.as_deref() == Some(name) {
                        "*".green()
                    } else {
                        " ".normal()
                    };
                    println!("{} {:<16} {:<40} {}", marker, name, entry.path, entry.description);
                }
            }
        }
        ConfigCommand::Path { name } => match name {
            Some(doc_name) => {
                let config = Config::load_or_default(&config_path)?;
                match config.get_document(doc_name) {
                    Some(entry) => println!("{}", entry.path),
                    None => println!(
                        "{} Document '{}' not found. Use 'tmx config register' to add it.",
                        "!".yellow(),
                        doc_name
                    ),
                }
            }
            None => {
                let path = determine_metadata_path(cli.file.as_deref(), cli.doc.as_deref())?;
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}
