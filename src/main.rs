mod banks;
mod categorizer;
mod cli;
mod coerce;
mod error;
mod importer;
mod reader;
mod store;
mod transaction;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let result = match cli.command {
        Commands::Init => cli::init::run(&cli.db),
        Commands::Import {
            file,
            bank,
            account_type,
            mapping,
        } => cli::import::run(&cli.db, &file, &bank, account_type.as_deref(), &mapping),
        Commands::Categories => cli::categories::run(&cli.db),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
