//! `styx-explorer`: browse and edit a Styx tree store over HTTP or from the shell.
//!
//! ## Usage
//!
//! ```sh
//! # Serve the web explorer (defaults: port 8080, file:data/datastore.styx)
//! styx-explorer serve --server-port 9090 --datastore-url file:data/store.styx
//!
//! # Run one operation offline and print the page as JSON
//! styx-explorer --datastore-url file:data/store.styx get /config --mode browse
//!
//! # Print the raw value at a path
//! styx-explorer get /config/users --mode content
//!
//! # Dump and restore a whole store
//! styx-explorer export file:data/store.styx backup.styx
//! styx-explorer import memory: backup.styx
//! ```

mod config;
mod html;
mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use styx_data::explorer::{self, BrowseParams, Outcome};
use styx_data::{Datastore, Error, Reference};

use crate::config::ConfigLayer;

#[derive(Parser)]
#[command(
    name = "styx-explorer",
    version,
    about = "Browse and edit a Styx tree store"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Datastore URL (`memory:`, `file:<path>` or a plain path)
    #[arg(long, global = true)]
    datastore_url: Option<String>,

    /// Properties file (defaults to ./styx.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP explorer
    Serve {
        /// Port to listen on
        #[arg(long)]
        server_port: Option<u16>,
        /// Number of request worker threads
        #[arg(long)]
        worker_threads: Option<usize>,
    },
    /// Run one explorer operation and print the result
    Get {
        /// Reference path, e.g. /config/users
        path: String,
        #[arg(long, value_enum, default_value_t = Mode::View)]
        mode: Mode,
    },
    /// Write the whole store to a file
    Export {
        #[arg(value_name = "DATASTORE_URL")]
        store: String,
        destination: PathBuf,
    },
    /// Replace the whole store with the contents of a file
    Import {
        #[arg(value_name = "DATASTORE_URL")]
        store: String,
        source: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Browse,
    View,
    Edit,
    Content,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            server_port,
            worker_threads,
        } => {
            let args = ConfigLayer {
                server_port,
                datastore_url: cli.datastore_url,
                worker_threads,
            };
            let config = config::load(cli.config.as_deref(), args)?;
            server::run(&config)?;
        }
        Commands::Get { path, mode } => {
            let args = ConfigLayer {
                datastore_url: cli.datastore_url,
                ..ConfigLayer::default()
            };
            let config = config::load(cli.config.as_deref(), args)?;
            let datastore = Datastore::open(&config.datastore_url)
                .with_context(|| format!("Failed to open datastore {}", config.datastore_url))?;
            let reference = Reference::from_path(&path)
                .with_context(|| format!("Invalid reference path: {path}"))?;
            let output = run_get(&datastore, &reference, mode)?;
            println!("{output}");
        }
        Commands::Export { store, destination } => {
            let datastore = Datastore::open(&store)
                .with_context(|| format!("Failed to open datastore {store}"))?;
            let count = datastore
                .export_to(&destination)
                .with_context(|| format!("Failed to export into {}", destination.display()))?;
            info!("Export finished");
            println!(
                "Exported {count} entries from {store} into {}",
                destination.display()
            );
        }
        Commands::Import { store, source } => {
            let datastore = Datastore::open(&store)
                .with_context(|| format!("Failed to open datastore {store}"))?;
            let count = datastore
                .import_from(&source)
                .with_context(|| format!("Failed to import from {}", source.display()))?;
            info!("Import finished");
            println!(
                "Imported {count} entries from {} into {store}",
                source.display()
            );
        }
    }

    Ok(())
}

/// Run one operation against its own session and render the result as text.
fn run_get(datastore: &Datastore, reference: &Reference, mode: Mode) -> Result<String> {
    let mut session = datastore.session()?;
    let rendered = match mode {
        Mode::Browse => {
            let mut outcome = explorer::browse(&mut session, reference, BrowseParams::default())?;
            if let Outcome::Redirect { .. } = outcome {
                outcome = explorer::browse(&mut session, reference, BrowseParams::default())?;
            }
            outcome.page().map(|page| serde_json::to_string_pretty(&page)).transpose()?
        }
        Mode::View => explorer::view(&session, reference)?
            .page()
            .map(|page| serde_json::to_string_pretty(&page))
            .transpose()?,
        Mode::Edit => explorer::edit(&mut session, reference, None)?
            .page()
            .map(|page| serde_json::to_string_pretty(&page))
            .transpose()?,
        Mode::Content => explorer::content(&session, reference)?.page(),
    };
    rendered.ok_or_else(|| Error::NotFound(reference.to_string()).into())
}
