mod board;
mod classify;
mod cli;
mod config;
mod countdown;
mod error;
mod model;
mod priority;
mod store;
mod workflow;

use std::process;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use store::SqliteStore;

fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("PROCUREFLOW_LOG")
                .unwrap_or_else(|_| EnvFilter::new(config.log.as_deref().unwrap_or("warn"))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = config.database_path().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let store = match SqliteStore::open(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open {}: {e}", path.display());
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, &store) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
