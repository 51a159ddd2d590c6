//! rtconf CLI
//!
//! Command-line tools for inspecting how realtime lookups map onto the
//! document store.
//!
//! # Commands
//!
//! - `translate` - Print the store query generated for lookup terms
//! - `find` - Run a lookup against a JSON fixture
//! - `load` - Rebuild a static configuration file from a JSON fixture
//! - `check-config` - Validate a bridge settings file

mod commands;
mod fixture;
mod terms;

use clap::{Parser, Subcommand};
use rtconf_core::{ConfFile, LogSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Realtime configuration bridge tools.
#[derive(Parser)]
#[command(name = "rtconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bridge settings file (ast_mongo.conf)
    #[arg(global = true, short, long)]
    settings: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the query envelope for lookup terms
    Translate {
        /// Field to sort ascending by
        #[arg(short, long)]
        order_by: Option<String>,

        /// Lookup terms: `name=value` or `"name OP value"`
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Run a lookup against a fixture
    Find {
        /// JSON fixture mapping table names to documents
        #[arg(short, long)]
        fixture: PathBuf,

        /// Database name
        #[arg(short, long, default_value = "asterisk")]
        database: String,

        /// Table to search
        #[arg(short, long)]
        table: String,

        /// Return every matching row instead of the first
        #[arg(short, long)]
        many: bool,

        /// Field to sort by when returning many rows
        #[arg(short, long)]
        order_by: Option<String>,

        /// Output format (text, json, conf)
        #[arg(long, default_value = "text")]
        format: String,

        /// Lookup terms: `name=value` or `"name OP value"`
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Rebuild a static configuration file from a fixture
    Load {
        /// JSON fixture mapping table names to documents
        #[arg(short, long)]
        fixture: PathBuf,

        /// Database name
        #[arg(short, long, default_value = "asterisk")]
        database: String,

        /// Table holding static configuration records
        #[arg(short, long, default_value = "ast_config")]
        table: String,

        /// Configuration file name to rebuild
        #[arg(long)]
        file: String,
    },

    /// Validate a settings file
    CheckConfig {
        /// Settings file to check
        #[arg(short, long)]
        path: PathBuf,

        /// Also check a record logger category
        #[arg(long)]
        records: Option<String>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = cli.settings.as_deref().map(ConfFile::load).transpose()?;

    // Initialize logging
    let level = if cli.verbose {
        "debug"
    } else {
        settings
            .as_ref()
            .and_then(|source| LogSettings::from_source(source).filter_level())
            .unwrap_or("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .init();

    match cli.command {
        Commands::Translate { order_by, terms } => {
            commands::translate::run(settings.as_ref(), &terms, order_by.as_deref())?;
        }
        Commands::Find {
            fixture,
            database,
            table,
            many,
            order_by,
            format,
            terms,
        } => {
            let request = commands::find::FindRequest {
                database: &database,
                table: &table,
                many,
                order_by: order_by.as_deref(),
                format: &format,
            };
            commands::find::run(settings.as_ref(), &fixture, &request, &terms)?;
        }
        Commands::Load {
            fixture,
            database,
            table,
            file,
        } => {
            commands::load::run(settings.as_ref(), &fixture, &database, &table, &file)?;
        }
        Commands::CheckConfig {
            path,
            records,
            format,
        } => {
            commands::check_config::run(&path, records.as_deref(), &format)?;
        }
        Commands::Version => {
            println!("rtconf CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
