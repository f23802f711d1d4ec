//! Primary entrypoint for the `librovore` CLI binary.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    librovore_cli::run().await
}
