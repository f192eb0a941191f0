//! watchctl — inspect and edit WatchGrid watcher configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use watchgrid_session::FileEndpoint;

mod commands;
mod config;

use config::ConsoleConfig;

#[derive(Parser)]
#[command(
    name = "watchctl",
    about = "WatchGrid — watcher configuration console",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Config file (default: ./watchctl.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Watcher store, overrides `store` from the config file
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved watchers
    List,
    /// Show a watcher's checkers, trigger and policies
    Show {
        name: String,
        /// Print the wire JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Validate every saved watcher
    Validate,
    /// Create an empty watcher
    New {
        name: String,
        /// Supervisor implementation tag
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
    /// Change the voting strategy (all, any, most, custom) and recompute weights
    SetStrategy { name: String, strategy: String },
    /// Set a metric policy's operational range, e.g. "[0‥80)"
    SetRange {
        name: String,
        policy: String,
        range: String,
    },
    /// Apply the catalog's recommended range to a metric policy
    Recommend { name: String, policy: String },
    /// Delete a watcher
    Delete { name: String },
    /// Color a sample attribute value with the watcher's checker
    Classify {
        name: String,
        attribute: String,
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },
    /// List supervisor types and component attributes from the catalog
    Catalog,
    /// Parse an operational range and print its canonical form
    Range {
        text: String,
        /// Check whether this value lies inside the range
        #[arg(long, allow_hyphen_values = true)]
        value: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store = store;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_filter.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut endpoint = FileEndpoint::new(&config.store);
    if let Some(catalog) = &config.catalog {
        endpoint = endpoint.with_catalog(catalog);
    }

    match cli.command {
        Commands::List => commands::watcher::list(&endpoint).await,
        Commands::Show { name, json } => commands::watcher::show(&endpoint, &name, json).await,
        Commands::Validate => commands::watcher::validate(&endpoint).await,
        Commands::New { name, kind } => {
            commands::watcher::create(&endpoint, &name, kind, &config.default_strategy).await
        }
        Commands::SetStrategy { name, strategy } => {
            commands::watcher::set_strategy(&endpoint, &name, &strategy).await
        }
        Commands::SetRange {
            name,
            policy,
            range,
        } => commands::watcher::set_range(&endpoint, &name, &policy, &range).await,
        Commands::Recommend { name, policy } => {
            commands::watcher::recommend(&endpoint, &name, &policy).await
        }
        Commands::Delete { name } => commands::watcher::delete(&endpoint, &name).await,
        Commands::Classify {
            name,
            attribute,
            value,
        } => commands::watcher::classify(&endpoint, &name, &attribute, value).await,
        Commands::Catalog => commands::watcher::catalog(&endpoint).await,
        Commands::Range { text, value } => commands::range::check(&text, value),
    }
}
