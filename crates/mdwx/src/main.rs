//! mdwx CLI - Markdown to WeChat Official Account publishing.
//!
//! Provides commands for:
//! - `preview`: Render a note to themed HTML for local inspection
//! - `publish`: Render a note and create (optionally publish) a WeChat draft
//! - `check`: Verify account credentials and connectivity
//! - `themes`: List available themes and highlight themes

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{PreviewArgs, PublishArgs};
use output::Output;

/// mdwx - Markdown to WeChat publishing.
#[derive(Parser)]
#[command(name = "mdwx", version, about)]
struct Cli {
    /// Enable verbose logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a note to themed HTML for local inspection.
    Preview(PreviewArgs),
    /// Render a note and create a WeChat draft.
    Publish(PublishArgs),
    /// Verify account credentials and connectivity.
    Check,
    /// List available themes and highlight themes.
    Themes,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Preview(args) => args.execute(&output),
        Commands::Publish(args) => args.execute(&output),
        Commands::Check => commands::check(&output),
        Commands::Themes => commands::themes(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
