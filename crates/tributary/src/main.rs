//! Tributary CLI binary.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tributary::cli::Cli;

/// Main entry point for the tributary CLI.
///
/// Uses tokio's current_thread runtime; every command is a short sequence of
/// file reads followed by in-memory graph work.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=tributary=debug,tributary_jsonl=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tributary=info,tributary_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting tributary CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Tributary CLI completed successfully");
    Ok(())
}
