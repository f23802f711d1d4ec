//! # CLI structure and argument parsing
//!
//! Mirrors the five orchestration operations exposed by `librovore-core`
//! (spec §6) as one subcommand each, with arguments and defaults lifted
//! directly from the operations table.

use clap::{Parser, Subcommand, ValueEnum};
use librovore_core::types::MatchMode as CoreMatchMode;

/// Documentation search from the command line.
#[derive(Debug, Parser)]
#[command(name = "librovore", version, about = "Documentation search and extraction")]
pub struct Cli {
    /// Output format for machine consumption.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// The operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Rendering mode for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// How a query's name filter is matched against inventory object names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchModeArg {
    /// Case-insensitive full-string equality.
    Exact,
    /// Case-insensitive regular expression.
    Regex,
    /// Normalized similarity ratio.
    Fuzzy,
}

impl From<MatchModeArg> for CoreMatchMode {
    fn from(value: MatchModeArg) -> Self {
        match value {
            MatchModeArg::Exact => Self::Exact,
            MatchModeArg::Regex => Self::Regex,
            MatchModeArg::Fuzzy => Self::Fuzzy,
        }
    }
}

/// Shared name-matching flags for every search-bearing subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct SearchBehaviorArgs {
    /// How to match `query` against inventory object names.
    #[arg(long, value_enum, default_value_t = MatchModeArg::Fuzzy)]
    pub match_mode: MatchModeArg,

    /// Minimum fuzzy-match ratio (0-100) to keep a candidate.
    #[arg(long, default_value_t = 50)]
    pub fuzzy_threshold: u32,
}

/// Shared equality filters for every inventory-bearing subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct FilterArgs {
    /// Restrict to a Sphinx domain (`py`, `std`, ...).
    #[arg(long)]
    pub domain: Option<String>,

    /// Restrict to a role/item-type (`function`, `class`, ...).
    #[arg(long)]
    pub role: Option<String>,

    /// Restrict to a Sphinx priority (`0`, `1`, `-1`).
    #[arg(long)]
    pub priority: Option<String>,

    /// Restrict to names containing this substring (Rustdoc).
    #[arg(long)]
    pub name: Option<String>,
}

/// The five operations the core exposes, plus the MCP server launcher.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Identify which processor(s) best handle a documentation source.
    Detect {
        /// The documentation source (URL or local path).
        source: String,
        /// Restrict detection to a single named processor.
        #[arg(long)]
        processor_name: Option<String>,
        /// Restrict detection to `inventory` or `structure` processors only.
        #[arg(long)]
        genus: Option<String>,
    },

    /// Search a source's inventory by object name.
    QueryInventory {
        /// The documentation source (URL or local path).
        source: String,
        /// The name query.
        query: String,
        /// Restrict to a single named inventory processor.
        #[arg(long)]
        processor_name: Option<String>,
        #[command(flatten)]
        search: SearchBehaviorArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Maximum number of results to return.
        #[arg(long, default_value_t = 5)]
        results_max: usize,
    },

    /// Search, fetch, and extract ranked documentation content.
    QueryContent {
        /// The documentation source (URL or local path).
        source: String,
        /// The name query.
        query: String,
        /// Restrict to a single named processor pair.
        #[arg(long)]
        processor_name: Option<String>,
        #[command(flatten)]
        search: SearchBehaviorArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Include a truncated content preview per document.
        #[arg(long, default_value_t = true)]
        include_snippets: bool,
        /// Maximum number of results to return.
        #[arg(long, default_value_t = 10)]
        results_max: usize,
    },

    /// Render a plain-text summary of a source's inventory.
    SummarizeInventory {
        /// The documentation source (URL or local path).
        source: String,
        /// The name query (empty matches everything under fuzzy mode).
        #[arg(default_value = "")]
        query: String,
        /// Restrict to a single named inventory processor.
        #[arg(long)]
        processor_name: Option<String>,
        #[command(flatten)]
        search: SearchBehaviorArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Partition the summary by this inventory field.
        #[arg(long)]
        group_by: Option<String>,
    },

    /// List the registered inventory and structure processors.
    SurveyProcessors {
        /// Restrict the listing to a single processor name.
        name: Option<String>,
    },

    /// Run the MCP JSON-RPC tool server over stdio.
    Mcp,
}
