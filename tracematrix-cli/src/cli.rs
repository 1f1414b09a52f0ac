use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tracematrix_core::AssociationKind;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Keep a test traceability matrix consistent")]
pub struct Cli {
    /// Path to the metadata JSON file
    #[clap(long, global = true)]
    pub file: Option<PathBuf>,

    /// Document name to use from the config
    #[clap(long, short = 'd', global = true)]
    pub doc: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

fn parse_kind(s: &str) -> Result<AssociationKind, String> {
    AssociationKind::parse(s).ok_or_else(|| {
        format!(
            "unknown tag kind '{}' (expected requirements, designs, features or stories)",
            s
        )
    })
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty metadata file
    Init,

    /// Report duplicate keys and dangling references
    Check,

    /// Show the document, selection, clipboard and backup state
    Status,

    /// Manage release definition documents
    #[clap(subcommand)]
    Rdd(RddCommand),

    /// Manage the requirements of the selected RDD
    #[clap(subcommand)]
    Req(ReqCommand),

    /// Manage designs
    #[clap(subcommand)]
    Design(RecordCommand),

    /// Manage features
    #[clap(subcommand)]
    Feature(RecordCommand),

    /// Manage user stories
    #[clap(subcommand)]
    Story(RecordCommand),

    /// Manage tests
    #[clap(subcommand)]
    Test(TestCommand),

    /// Edit the tags a test carries
    #[clap(subcommand)]
    Tag(TagCommand),

    /// Copy and paste whole tag lists between tests
    #[clap(subcommand)]
    Clip(ClipCommand),

    /// Work with the scenarios of a feature file
    #[clap(subcommand)]
    Scenarios(ScenarioCommand),

    /// Add the test ids found in an XML result report
    Import {
        /// Path to the XML report
        path: PathBuf,
    },

    /// Export the document
    Export {
        /// Output format (csv, json)
        #[clap(long, default_value = "csv")]
        format: String,

        /// Table to export as CSV (requirements, designs, features, stories, tests); all if omitted
        #[clap(long)]
        view: Option<String>,

        /// Output file, or directory when exporting every CSV table
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Inspect or restore the session backup
    #[clap(subcommand)]
    Backup(BackupCommand),

    /// Manage named documents
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum RddCommand {
    /// List all RDDs
    List,

    /// Add an RDD and select it
    Add {
        /// Release name
        #[clap(long)]
        release: Option<String>,

        /// Where the RDD lives
        #[clap(long)]
        location: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Select the RDD that requirement commands work on
    Select {
        release: String,
    },

    /// Show an RDD and its requirements (the selected one by default)
    Show {
        release: Option<String>,
    },

    /// Edit the selected RDD
    Edit {
        /// New release name
        #[clap(long)]
        release: Option<String>,

        /// New location
        #[clap(long)]
        location: Option<String>,
    },

    /// Remove the selected RDD and its requirements
    Remove {
        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReqCommand {
    /// List requirements of the selected RDD
    List {
        /// List requirements of every RDD
        #[clap(long)]
        all: bool,
    },

    /// Add a requirement to the selected RDD
    Add {
        #[clap(long)]
        id: Option<String>,

        #[clap(long)]
        description: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Edit a requirement; a new id is propagated to tests and derived requirements
    Edit {
        id: String,

        #[clap(long)]
        new_id: Option<String>,

        #[clap(long)]
        description: Option<String>,
    },

    /// Remove a requirement from the selected RDD and every test
    Remove {
        id: String,

        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    /// List all entries
    List,

    /// Add an entry
    Add {
        #[clap(long)]
        id: Option<String>,

        #[clap(long)]
        location: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Edit an entry; a new id is propagated to tests
    Edit {
        id: String,

        #[clap(long)]
        new_id: Option<String>,

        #[clap(long)]
        location: Option<String>,
    },

    /// Remove an entry and every test reference to it
    Remove {
        id: String,

        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TestCommand {
    /// List all tests
    List,

    /// Show a test and its tags
    Show {
        id: String,
    },

    /// Add a test
    Add {
        #[clap(long)]
        id: Option<String>,

        #[clap(long)]
        release: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Edit a test's id or release
    Edit {
        id: String,

        #[clap(long)]
        new_id: Option<String>,

        #[clap(long)]
        release: Option<String>,
    },

    /// Remove a test
    Remove {
        id: String,

        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Show a test's tags, optionally of one kind
    List {
        test: String,

        #[clap(value_parser = parse_kind)]
        kind: Option<AssociationKind>,
    },

    /// Show the values that can still be added
    Options {
        test: String,

        #[clap(value_parser = parse_kind)]
        kind: AssociationKind,

        /// Case-insensitive substring filter
        #[clap(long)]
        filter: Option<String>,
    },

    /// Add a value to a test's list
    Add {
        test: String,

        #[clap(value_parser = parse_kind)]
        kind: AssociationKind,

        value: String,
    },

    /// Remove a value from a test's list
    Remove {
        test: String,

        #[clap(value_parser = parse_kind)]
        kind: AssociationKind,

        value: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClipCommand {
    /// Show what is staged
    Show,

    /// Stage a test's list
    Copy {
        #[clap(value_parser = parse_kind)]
        kind: AssociationKind,

        test: String,
    },

    /// Merge the staged list into a test's list
    Paste {
        #[clap(value_parser = parse_kind)]
        kind: AssociationKind,

        test: String,
    },

    /// Empty a test's list
    Clear {
        #[clap(value_parser = parse_kind)]
        kind: AssociationKind,

        test: String,

        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ScenarioCommand {
    /// Read the scenarios of a feature file
    Load {
        path: PathBuf,
    },

    /// List the loaded scenarios with their tests' tags
    List,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// Show whether a backup exists and when it was written
    Status,

    /// Replace the metadata file with the backup
    Restore {
        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Delete the backup
    Discard,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Register a document under a name
    Register {
        #[clap(long)]
        name: Option<String>,

        /// Path to the metadata file
        #[clap(long)]
        path: Option<PathBuf>,

        #[clap(long)]
        description: Option<String>,

        /// Set this document as the default
        #[clap(long)]
        default: bool,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// List registered documents
    List,

    /// Print the path of a document, or of the one commands would use
    Path {
        #[clap(long)]
        name: Option<String>,
    },
}
