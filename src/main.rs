use anyhow::Result;
use clap::{Parser, Subcommand};
use tasave::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Write the snapshot here instead of the configured output path
    #[arg(short, long)]
    output: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => tasave::cli::setup::setup(),
        None => tasave::run(cli.config_path.as_deref(), cli.output.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %failure_message(e), "Application failed");
    }
    result
}

/// The whole context chain on one line, e.g. "Failed to write snapshot to data.json: Permission denied".
fn failure_message(e: &anyhow::Error) -> String {
    format!("{e:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_failure_message_keeps_inner_causes() {
        let err = std::fs::read_to_string("/nonexistent/tasave/data.json")
            .context("Failed to read snapshot")
            .unwrap_err();

        let message = failure_message(&err);

        assert!(message.starts_with("Failed to read snapshot: "));
        assert!(message.len() > "Failed to read snapshot: ".len());
    }
}
