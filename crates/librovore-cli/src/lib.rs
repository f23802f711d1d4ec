//! # librovore-cli
//!
//! The command-line front end for librovore: one subcommand per
//! orchestration operation (spec §6), plus a launcher for the MCP server.
//! Argument parsing, help text, and console rendering are deliberately thin
//! (spec §1 Non-goals) — this crate's job is to parse arguments into the
//! core's request shapes, call the core, and print the result.

/// Subcommand definitions and argument parsing.
pub mod cli;
/// Per-operation command implementations.
pub mod commands;
/// CLI error rendering.
pub mod error;
/// JSON and text response rendering.
pub mod output;

use std::process::ExitCode;

use clap::Parser;
use librovore_core::registry::{ProcessorContext, ProcessorRegistry};
use librovore_core::types::{InventoryFilters, SearchBehaviors};
use librovore_core::Config;

use cli::{Cli, Command, OutputFormat};
use error::CliError;

/// Parses arguments, runs the requested operation, and returns the process
/// exit code (spec §6 "Exit codes": 0 on success, 1 on any surfaced error).
pub async fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        },
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        },
    }
}

async fn dispatch(cli: Cli) -> Result<String, CliError> {
    let format = cli.format;

    if let Command::Mcp = cli.command {
        commands::mcp().await?;
        return Ok(String::new());
    }

    let config = Config::load().unwrap_or_default();
    let registry = ProcessorRegistry::with_builtins(&config);
    let ctx = ProcessorContext::new(&config);

    match cli.command {
        Command::Mcp => unreachable!("handled above"),
        Command::Detect {
            source,
            processor_name,
            genus,
        } => {
            commands::detect(
                &registry,
                &ctx,
                &source,
                processor_name.as_deref(),
                genus.as_deref(),
                format,
            )
            .await
        },
        Command::QueryInventory {
            source,
            query,
            processor_name,
            search,
            filters,
            results_max,
        } => {
            let behaviors = search_behaviors(&search);
            let filters = inventory_filters(&filters);
            commands::query_inventory(
                &registry,
                &ctx,
                &source,
                &query,
                processor_name.as_deref(),
                &behaviors,
                &filters,
                results_max,
                format,
            )
            .await
        },
        Command::QueryContent {
            source,
            query,
            processor_name,
            search,
            filters,
            include_snippets,
            results_max,
        } => {
            let behaviors = search_behaviors(&search);
            let filters = inventory_filters(&filters);
            commands::query_content(
                &registry,
                &ctx,
                &source,
                &query,
                processor_name.as_deref(),
                &behaviors,
                &filters,
                include_snippets,
                results_max,
                format,
            )
            .await
        },
        Command::SummarizeInventory {
            source,
            query,
            processor_name,
            search,
            filters,
            group_by,
        } => {
            let behaviors = search_behaviors(&search);
            let filters = inventory_filters(&filters);
            commands::summarize_inventory(
                &registry,
                &ctx,
                &source,
                &query,
                processor_name.as_deref(),
                &behaviors,
                &filters,
                group_by.as_deref(),
            )
            .await
        },
        Command::SurveyProcessors { name } => {
            commands::survey_processors(&registry, name.as_deref(), format)
        },
    }
}

fn search_behaviors(args: &cli::SearchBehaviorArgs) -> SearchBehaviors {
    SearchBehaviors {
        match_mode: args.match_mode.into(),
        fuzzy_threshold: args.fuzzy_threshold,
    }
}

fn inventory_filters(args: &cli::FilterArgs) -> InventoryFilters {
    InventoryFilters {
        domain: args.domain.clone(),
        role: args.role.clone(),
        priority: args.priority.clone(),
        name: args.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
