//! `mcp` command: launches the JSON-RPC tool server over stdio.
//!
//! The MCP transport itself — framing, schema generation — is out of scope
//! for this spec (spec §1); this command is just the CLI's launcher for it.

use crate::error::CliError;

/// Runs the MCP server until stdin closes or the process is interrupted.
pub async fn execute() -> Result<(), CliError> {
    librovore_mcp::serve_stdio()
        .await
        .map_err(|err| CliError(librovore_core::Error::Config(err.to_string())))
}
