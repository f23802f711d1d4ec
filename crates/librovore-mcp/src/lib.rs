//! An MCP (Model Context Protocol) JSON-RPC tool server for librovore.
//!
//! Exposes the five documentation-search operations — `detect`,
//! `query-inventory`, `query-content`, `summarize-inventory`, and
//! `survey-processors` — as MCP tools over stdio, so an AI assistant can
//! detect a documentation site's format and search it without shelling out
//! to the CLI.

pub mod error;
pub mod server;
pub mod tools;

pub use error::{McpError, McpResult};
pub use server::LibrovoreMcpServer;

use librovore_core::Config;
use librovore_core::registry::{ProcessorContext, ProcessorRegistry};

/// Builds a server from the on-disk configuration and serves the MCP
/// protocol over stdio until the client disconnects.
///
/// # Errors
///
/// Returns an error if configuration loading fails unrecoverably, or if the
/// stdio transport fails to initialize or encounters a runtime error.
pub async fn serve_stdio() -> McpResult<()> {
    let config = Config::load()?;
    let registry = ProcessorRegistry::with_builtins(&config);
    let ctx = ProcessorContext::new(&config);
    let server = LibrovoreMcpServer::new(registry, ctx);

    tracing::info!("librovore MCP server starting");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let service = rmcp::serve_server(server, (stdin, stdout))
        .await
        .map_err(|err| {
            tracing::error!("server initialization error: {err}");
            McpError::Transport(err.to_string())
        })?;

    service.waiting().await.map_err(|err| {
        tracing::error!("server runtime error: {err}");
        McpError::Transport(err.to_string())
    })?;

    tracing::info!("librovore MCP server stopped");
    Ok(())
}
