//! Pokedex CLI - browse PokeAPI location areas and catch Pokemon
//!
//! An interactive prompt that pages through location areas, explores them and
//! keeps a Pokedex of caught Pokemon for the length of the session. API
//! responses are memoized in an in-memory cache that expires on a timer.

use std::io;
use std::process;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pokedex::cache::TtlCache;
use pokedex::cli::{Cli, StartupConfig};
use pokedex::commands::Session;
use pokedex::data::PokeApiClient;
use pokedex::repl;

/// Sets up tracing on stderr so log lines never interleave with REPL output
fn init_logging(config: &StartupConfig) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(2);
        }
    };

    init_logging(&config);
    tracing::debug!(?config, "starting pokedex");

    let cache = TtlCache::new(config.cache_interval);
    let client = PokeApiClient::with_base_url(cache.clone(), config.base_url.clone());
    let mut session = match config.seed {
        Some(seed) => Session::with_seed(client, seed),
        None => Session::new(client),
    };
    tracing::debug!(
        interval = ?cache.interval(),
        base_url = session.client.base_url(),
        "session ready"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    let result = repl::run(&mut session, stdin, &mut stdout).await;

    // Stop the reaper before the runtime goes away
    cache.shutdown().await;

    result?;
    Ok(())
}
