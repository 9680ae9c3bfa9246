pub mod toml_config;

pub use toml_config::{AppConfig, DatabaseConfig, ImportConfig, MailConfig, ServerConfig};

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "small-backoffice")]
#[command(about = "Report imports, order processing and a user lookup service")]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import a comma-separated report from the import directory
    Import {
        /// File name relative to import.base_dir
        file: String,

        /// Record malformed rows and continue instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Process an order described by a JSON file
    Order {
        /// Path to the order JSON
        path: String,
    },
    /// Set the stock level of a SKU
    Stock { sku: String, quantity: u32 },
    /// Run the user HTTP service
    Serve {
        /// Override server.bind
        #[arg(long)]
        bind: Option<String>,
    },
}
