//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xex-porter")]
#[command(about = "Dump, analyse and catalog Xbox 360 titles for static recompilation", long_about = None)]
pub(crate) struct Cli {
    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Catalog database path (overrides settings.toml)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the full pipeline from a drive, disc image or binary
    Pipeline {
        /// Optical drive to dump (e.g., E: or /dev/sr0)
        #[arg(long)]
        drive: Option<String>,

        /// Disc image to extract
        #[arg(long)]
        iso: Option<PathBuf>,

        /// Binary to analyse directly
        #[arg(long)]
        xex: Option<PathBuf>,

        /// Output directory (default: <temp dir>/pipeline_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not record the result in the catalog or a workspace
        #[arg(long)]
        no_catalog: bool,
    },

    /// Print the identity of a binary
    Analyse {
        /// Path to the .xex file
        xex: PathBuf,
    },

    /// Write a build configuration for a binary
    Toml {
        /// Path to the .xex file
        xex: PathBuf,

        /// Analysis report to use as switch table
        #[arg(long)]
        report: Option<PathBuf>,

        /// Directory to write config.toml into (default: next to the binary)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run the recompiler against the written file
        #[arg(long)]
        validate: bool,
    },

    /// Query and edit the title catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Inspect and reconcile per-title workspaces
    Workspace {
        #[command(subcommand)]
        action: WorkspaceAction,
    },

    /// List and edit per-title game profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum CatalogAction {
    /// List titles, most recently updated first
    List {
        /// Only titles with this status
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum number of titles to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Find titles by name or title id
    Search {
        /// Substring of the name or title id
        term: String,
    },

    /// Show every field of one title
    Show {
        /// Catalog id
        id: i64,
    },

    /// Set a title's status, optionally with notes and paths
    Status {
        /// Catalog id
        id: i64,

        /// New status (pending, dumped, extracted, analysed, in_progress, completed, failed)
        status: String,

        /// Replace the notes
        #[arg(long)]
        notes: Option<String>,

        /// Record a binary path
        #[arg(long)]
        xex: Option<PathBuf>,

        /// Record a disc image path
        #[arg(long)]
        iso: Option<PathBuf>,
    },

    /// Remove a title from the catalog (its workspace is kept)
    Delete {
        /// Catalog id
        id: i64,

        /// Actually delete
        #[arg(long)]
        confirm: bool,
    },

    /// Title counts per status
    Stats,
}

#[derive(Subcommand)]
pub(crate) enum WorkspaceAction {
    /// List tracked files that live outside the title's workspace
    Check {
        /// Catalog id
        id: i64,
    },

    /// Copy external files into the workspace and update the catalog
    Sync {
        /// Catalog id
        id: i64,

        /// Compare SHA-1 digests after copying
        #[arg(long)]
        verify: bool,
    },

    /// List all workspaces under the ports root
    List,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show resolved settings and where each value came from
    Show,

    /// Print the settings file path
    Path,
}

#[derive(Subcommand)]
pub(crate) enum ProfileAction {
    /// List title profiles, sorted by game name
    List,

    /// Show every setting of one profile
    Show {
        /// Title id (e.g., 4D5307E6)
        title_id: String,
    },

    /// Write an empty profile for a title
    Create {
        /// Title id (e.g., 4D5307E6)
        #[arg(short, long)]
        title_id: String,

        /// Game name
        #[arg(short, long)]
        name: String,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,

        /// Replace an existing profile
        #[arg(short, long)]
        force: bool,
    },

    /// Show the profile used for titles without their own
    Default,
}
