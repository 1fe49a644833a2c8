use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::{
    catalog::Category,
    filter::{self, FilterState, Scope, TypeFilter},
    session::VenueRef,
};

#[derive(Debug, Parser)]
#[command(
    name = "venuedex",
    about = "Filter, search and bookmark a ranked catalog of academic venues"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Catalog document to load instead of the configured one
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Filter and search the catalog
    Search(SearchArgs),
    /// Toggle a venue in the selection
    Select(SelectArgs),
    /// Show the selected venues
    Selected(SelectedArgs),
    /// Remove every venue from the selection
    Clear,
    /// List the fields of study in the catalog
    Fields(FieldsArgs),
    /// Manage the stored catalog path
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Show configuration and catalog statistics
    Status(StatusArgs),
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Case-insensitive text matched against abbreviations and full names
    #[arg(default_value = "")]
    pub query: String,

    /// Only this rank label (e.g. A, B, C)
    #[arg(short = 'r', long, default_value = filter::ALL)]
    pub rank: String,

    /// Only this field of study (exact name)
    #[arg(short = 'f', long, default_value = filter::ALL)]
    pub field: String,

    /// Only journals or only conferences
    #[arg(short = 't', long = "type", default_value = "all")]
    pub kind: TypeFilter,

    /// Show selection markers next to each result
    #[arg(short = 's', long)]
    pub select_mode: bool,

    /// Output as JSON
    #[arg(long, conflicts_with = "html")]
    pub json: bool,

    /// Output as an HTML table
    #[arg(long)]
    pub html: bool,
}

impl SearchArgs {
    pub fn filter(&self) -> FilterState {
        FilterState::new()
            .with_rank(Scope::from_control(&self.rank))
            .with_field(Scope::from_control(&self.field))
            .with_kind(self.kind)
            .with_query(&self.query)
            .with_selection_mode(self.select_mode)
    }
}

// -- Select --

#[derive(Debug, Parser)]
pub struct SelectArgs {
    /// Venue abbreviation, exactly as listed
    #[arg(required_unless_present = "key")]
    pub abbreviation: Option<String>,

    /// Venue key as printed by `search --json`
    #[arg(long, conflicts_with_all = ["abbreviation", "field", "category"])]
    pub key: Option<String>,

    /// Field of study, when the abbreviation is ambiguous
    #[arg(short = 'f', long)]
    pub field: Option<String>,

    /// journal or conference, when the abbreviation is ambiguous
    #[arg(short = 'c', long)]
    pub category: Option<Category>,
}

impl SelectArgs {
    pub fn venue(&self) -> VenueRef {
        match (&self.key, &self.abbreviation) {
            (Some(key), _) => VenueRef::Key(key.clone()),
            (None, abbreviation) => VenueRef::Abbreviation {
                abbreviation: abbreviation.clone().unwrap_or_default(),
                field: self.field.clone(),
                category: self.category,
            },
        }
    }
}

// -- Selected --

#[derive(Debug, Parser)]
pub struct SelectedArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Fields --

#[derive(Debug, Parser)]
pub struct FieldsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Catalog --

#[derive(Debug, Subcommand)]
pub enum CatalogAction {
    /// Show the resolved catalog path
    Show,
    /// Persist a catalog path in config.redb
    Set {
        /// Path to the catalog JSON document
        path: PathBuf,
    },
    /// Clear the stored catalog path (revert to the default)
    Clear,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "venuedex",
            &mut std::io::stdout(),
        );
    }
}
