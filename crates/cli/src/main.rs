//! Bazaar CLI - catalog sync and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Merge a product list from a file into the catalog
//! bazaar-cli sync --file products-export.json
//!
//! # Merge a product list fetched from a remote endpoint
//! bazaar-cli sync --url https://vendor.example.com/catalog.json
//!
//! # Add a login credential (password read from stdin)
//! echo 'correct horse battery' | bazaar-cli credentials add -e admin@example.com -r admin
//!
//! # Print the catalog with owners
//! bazaar-cli list products
//! ```
//!
//! # Commands
//!
//! - `sync` - Merge an external product list and download its images
//! - `credentials` - Hash passwords and manage the credentials file
//! - `list` - Print stored products or users as JSON

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge an external product list into the catalog
    Sync {
        /// JSON file holding a product list
        #[arg(short, long, conflicts_with = "url", required_unless_present = "url")]
        file: Option<PathBuf>,

        /// Endpoint returning a product list
        #[arg(short, long)]
        url: Option<Url>,
    },
    /// Manage login credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// Print stored records as JSON
    List {
        #[command(subcommand)]
        target: ListTarget,
    },
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Hash a password read from stdin
    Hash,
    /// Append a credential to the credentials file (password read from stdin)
    Add {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Role (`admin`, `customer`)
        #[arg(short, long, default_value = "customer")]
        role: String,
    },
}

#[derive(Subcommand)]
enum ListTarget {
    /// Products joined with their owners
    Products,
    /// User records
    Users,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar_cli=info,bazaar_storefront=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let paths = commands::Paths::from_env();
    match cli.command {
        Commands::Sync { file, url } => {
            let source = match (file, url) {
                (Some(path), _) => commands::sync::Source::File(path),
                (None, Some(url)) => commands::sync::Source::Url(url),
                (None, None) => return Err("either --file or --url is required".into()),
            };
            commands::sync::run(&paths, source).await?;
        }
        Commands::Credentials { action } => match action {
            CredentialAction::Hash => commands::credentials::hash().await?,
            CredentialAction::Add { email, role } => {
                commands::credentials::add(&paths, &email, &role).await?;
            }
        },
        Commands::List { target } => match target {
            ListTarget::Products => commands::list::products(&paths).await?,
            ListTarget::Users => commands::list::users(&paths).await?,
        },
    }
    Ok(())
}
