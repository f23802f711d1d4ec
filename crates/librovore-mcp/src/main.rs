//! Standalone entrypoint for the librovore MCP server, for MCP clients that
//! launch it directly rather than through `librovore mcp`.

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = librovore_mcp::serve_stdio().await {
        eprintln!("error: {err}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}
