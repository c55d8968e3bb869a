mod commands;

use clap::Parser;
use commands::{execute_command, Commands};
use gazelle_dupe::Config;
use std::path::PathBuf;

/// Duplicate-release checker for Gazelle music trackers
#[derive(Parser)]
#[command(
    name = "gazelle-dupe",
    about = "Check a Gazelle tracker for existing copies of a release",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Site code from the configuration file
    #[arg(long, global = true, default_value = "RED")]
    site: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if args.verbose {
        println!("🔍 Verbose mode enabled");
    }

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = execute_command(args.command, &config, &args.site).await {
        eprintln!("❌ Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}
