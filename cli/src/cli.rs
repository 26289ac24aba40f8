use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "netdeck")]
#[command(about = "Browse and bulk-edit automation server tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Automation server URL (overrides the config file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the entity types that have a table
    Entities,
    /// Show one page of an entity table
    List {
        #[command(flatten)]
        table: TableArgs,

        /// Page number, starting at 0
        #[arg(long, short = 'p', default_value = "0")]
        page: usize,

        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,

        /// Sort by `column` or `column:desc`
        #[arg(long)]
        sort: Option<String>,

        /// Search across all properties (debounced like a search box)
        #[arg(long, short = 'q')]
        query: Option<String>,

        /// Ask the server for real record counts
        #[arg(long)]
        count: bool,

        /// Write the full result as CSV into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,

        /// Copy the server's clipboard text for the result
        #[arg(long)]
        copy: bool,

        /// Copy a shareable search link rooted at this URL
        #[arg(long, value_name = "ORIGIN")]
        link: Option<String>,
    },
    /// Show or change which columns a table displays
    Columns {
        /// Entity type, e.g. `device`
        entity: String,

        /// Comma-separated column keys to display from now on
        #[arg(long, value_delimiter = ',')]
        show: Option<Vec<String>>,
    },
    /// Flip a table between the current user's rows and everyone's
    Scope {
        /// Entity type, e.g. `service`
        entity: String,
    },
    /// Delete every row matching the search
    Delete {
        #[command(flatten)]
        table: TableArgs,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Detach every matching row from the parent given with `--parent`
    Remove {
        #[command(flatten)]
        table: TableArgs,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Change properties on every matching row
    Edit {
        #[command(flatten)]
        table: TableArgs,

        /// `property=value`; the value is read as JSON when it parses
        #[arg(long = "set", required = true)]
        changes: Vec<String>,

        /// `property=set|append|remove` for list properties
        #[arg(id = "edit_modes", long = "edit-mode")]
        modes: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Re-query a table periodically until interrupted
    Watch {
        #[command(flatten)]
        table: TableArgs,

        /// Seconds between refreshes (defaults to the configured rate)
        #[arg(long, short = 'i')]
        interval: Option<u64>,
    },
    /// Show the changelog of one entity type
    Changelog {
        /// Entity type whose changes are listed
        entity: String,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Which table to open and how to filter it.
#[derive(Args, Debug, Clone, Default)]
pub struct TableArgs {
    /// Entity type, e.g. `device`
    pub entity: String,

    /// `column=value` search term; booleans accept true/false
    #[arg(long = "search", short = 's')]
    pub searches: Vec<String>,

    /// `column=inclusion|equality|regex|empty`
    #[arg(long = "mode")]
    pub modes: Vec<String>,

    /// Invert the match of a text column
    #[arg(long = "invert")]
    pub inverted: Vec<String>,

    /// `key=value` constraint sent with every query; JSON values allowed
    #[arg(long = "constraint", short = 'c')]
    pub constraints: Vec<String>,

    /// Scope the table to a parent row: `type:id:name`
    #[arg(long, requires_all = ["from", "to"])]
    pub parent: Option<String>,

    /// Property of the listed rows pointing at the parent
    #[arg(long)]
    pub from: Option<String>,

    /// Property of the parent holding the listed rows
    #[arg(long)]
    pub to: Option<String>,

    /// Only the current user's rows
    #[arg(long, conflicts_with = "everyone")]
    pub mine: bool,

    /// Every user's rows
    #[arg(long)]
    pub everyone: bool,

    /// Ignore the parent/child hierarchy
    #[arg(long)]
    pub flat: bool,
}
