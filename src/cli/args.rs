// src/cli/args.rs
use crate::application::{ChallengeSort, SortDirection, SortField};
use crate::constants::API_URL_ENV;
use crate::domain::challenge::{CATEGORIES, DIFFICULTIES};
use crate::domain::ChallengeForm;
use clap::builder::PossibleValuesParser;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
#[command(arg_required_else_help = true, disable_help_subcommand = true)]
pub struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(long, value_name = "URL", env = API_URL_ENV, global = true)]
    pub api_url: Option<String>,

    /// Path to config file (optional)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage the security tool catalogue
    #[command(subcommand)]
    Tools(ToolsCommand),

    /// Manage challenges, their files and flags
    #[command(subcommand)]
    Challenges(ChallengesCommand),

    /// Browse, preview and edit notes
    #[command(subcommand)]
    Notes(NotesCommand),

    /// Manage the note folder hierarchy
    #[command(subcommand)]
    Folders(FoldersCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ToolsCommand {
    /// List tools grouped by category
    List {
        #[arg(long, value_name = "CATEGORY")]
        category: Option<String>,
    },

    /// Add a tool
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: Option<String>,
        /// Example command line
        #[arg(long)]
        command: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },

    /// Delete a tool
    Delete {
        #[arg(value_name = "TOOL_ID")]
        id: i64,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ChallengesCommand {
    /// List challenges (newest first unless a sort column is given)
    List {
        #[arg(long, value_enum, value_name = "FIELD")]
        sort: Option<SortColumn>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Show one challenge with its resources
    Show {
        #[arg(value_name = "CHALLENGE_ID")]
        id: i64,
    },

    /// Create a challenge, uploading the given files
    Add {
        #[command(flatten)]
        form: ChallengeFormArgs,

        /// File to attach (repeatable)
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,
    },

    /// Update a challenge; omitted fields keep their current value
    Edit {
        #[arg(value_name = "CHALLENGE_ID")]
        id: i64,

        #[command(flatten)]
        form: ChallengeFormArgs,
    },

    /// Delete a challenge
    Delete {
        #[arg(value_name = "CHALLENGE_ID")]
        id: i64,
    },

    /// Flip the solved flag
    ToggleSolved {
        #[arg(value_name = "CHALLENGE_ID")]
        id: i64,
    },

    /// Submit a flag
    CheckFlag {
        #[arg(value_name = "CHALLENGE_ID")]
        id: i64,
        #[arg(value_name = "FLAG")]
        flag: String,
    },

    /// Attach a file to a challenge
    Upload {
        #[arg(value_name = "CHALLENGE_ID")]
        id: i64,
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Download an attached file
    Download {
        #[arg(value_name = "CHALLENGE_ID")]
        id: i64,
        #[arg(value_name = "FILENAME")]
        filename: String,
        /// Destination (defaults to FILENAME in the current directory)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Remove an attached file
    DeleteFile {
        #[arg(value_name = "CHALLENGE_ID")]
        id: i64,
        #[arg(value_name = "FILENAME")]
        filename: String,
    },
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ChallengeFormArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_parser = PossibleValuesParser::new(CATEGORIES.iter().copied()))]
    pub category: Option<String>,
    #[arg(long, value_parser = PossibleValuesParser::new(DIFFICULTIES.iter().copied()))]
    pub difficulty: Option<String>,
    /// Expected flag, checked by the backend
    #[arg(long)]
    pub flag: Option<String>,
    /// Reference link (repeatable)
    #[arg(long = "link", value_name = "URL")]
    pub links: Vec<String>,
    /// Useful command (repeatable)
    #[arg(long = "cmd", value_name = "COMMAND")]
    pub commands: Vec<String>,
}

impl ChallengeFormArgs {
    /// Overwrites the fields given on the command line
    pub fn apply_to(&self, form: &mut ChallengeForm) {
        let overwrite = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                *target = value.clone();
            }
        };
        overwrite(&mut form.title, &self.title);
        overwrite(&mut form.description, &self.description);
        overwrite(&mut form.category, &self.category);
        overwrite(&mut form.difficulty, &self.difficulty);
        overwrite(&mut form.correct_flag, &self.flag);
        if !self.links.is_empty() {
            form.resources.links = self.links.clone();
        }
        if !self.commands.is_empty() {
            form.resources.commands = self.commands.clone();
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Title,
    Category,
    Difficulty,
    Created,
    Solved,
}

impl From<SortColumn> for SortField {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::Title => SortField::Title,
            SortColumn::Category => SortField::Category,
            SortColumn::Difficulty => SortField::Difficulty,
            SortColumn::Created => SortField::CreatedAt,
            SortColumn::Solved => SortField::Solved,
        }
    }
}

/// Sort order requested on the command line
pub fn challenge_sort(sort: Option<SortColumn>, desc: bool) -> ChallengeSort {
    match sort {
        None => ChallengeSort::default(),
        Some(column) => ChallengeSort {
            field: column.into(),
            direction: if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        },
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum NotesCommand {
    /// Print the folder tree fully expanded
    Tree,

    /// List notes at the root level or in one folder
    List {
        #[arg(long, value_name = "FOLDER_ID")]
        folder: Option<i64>,
    },

    /// Open a note preview in the browser
    Preview {
        #[arg(value_name = "NOTE_ID")]
        id: i64,

        /// Output note as JSON instead of opening in browser
        #[arg(long)]
        json: bool,
    },

    /// Interactive workspace with tabs, editor and autosave
    Shell,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FoldersCommand {
    /// Create a folder
    Add {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(long, value_name = "FOLDER_ID")]
        parent: Option<i64>,
    },

    /// Move a folder under another one (root when --parent is omitted)
    Move {
        #[arg(value_name = "FOLDER_ID")]
        id: i64,
        #[arg(long, value_name = "FOLDER_ID")]
        parent: Option<i64>,
    },

    /// Delete a folder and the notes filed in it
    Delete {
        #[arg(value_name = "FOLDER_ID")]
        id: i64,
    },
}
