pub mod categories;
pub mod import;
pub mod init;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "moneta",
    about = "Bank statement import and rule-based categorization."
)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "database.db")]
    pub db: String,

    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema and seed the category list.
    Init,
    /// Import a bank export, categorize it and store the result.
    Import {
        /// Path to the exported CSV file
        file: String,
        /// Source bank: revolut, airbank, raiffeisen
        #[arg(long)]
        bank: String,
        /// Account type: basic or savings (default: derived from the file name)
        #[arg(long = "account-type")]
        account_type: Option<String>,
        /// Rule mapping file
        #[arg(long, default_value = "mapping.yaml")]
        mapping: String,
    },
    /// List categories.
    Categories,
}
