//! Command-line interface parsing for the Pokedex CLI
//!
//! This module handles parsing of CLI arguments using clap and validates them
//! into the [`StartupConfig`] used to build the cache, client and session.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::data::DEFAULT_BASE_URL;

/// Default cache interval in milliseconds
pub const DEFAULT_CACHE_INTERVAL_MS: u64 = 5000;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The cache interval must be at least one millisecond
    #[error("Invalid cache interval: '{0}'. The interval must be greater than 0 ms")]
    InvalidInterval(u64),

    /// The API base URL is empty
    #[error("Invalid base URL: '{0}'. Expected something like https://pokeapi.co/api/v2")]
    InvalidBaseUrl(String),
}

/// Pokedex - browse PokeAPI location areas and catch Pokemon
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Interactive Pokedex backed by PokeAPI")]
#[command(version)]
pub struct Cli {
    /// How long API responses stay cached, in milliseconds
    ///
    /// Expired responses are swept once per interval, so a response may be
    /// reused for up to twice this long.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_CACHE_INTERVAL_MS)]
    pub cache_interval_ms: u64,

    /// Base URL of the PokeAPI v2 endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Seed for catch rolls, for reproducible sessions
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Cache sweep period and expiry threshold
    pub cache_interval: Duration,
    /// PokeAPI base URL without a trailing slash
    pub base_url: String,
    /// Fixed RNG seed, if any
    pub seed: Option<u64>,
    /// Whether debug logging is enabled
    pub verbose: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            cache_interval: Duration::from_millis(DEFAULT_CACHE_INTERVAL_MS),
            base_url: DEFAULT_BASE_URL.to_string(),
            seed: None,
            verbose: false,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the interval is zero or the base URL is empty
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.cache_interval_ms == 0 {
            return Err(CliError::InvalidInterval(cli.cache_interval_ms));
        }

        let base_url = cli.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(CliError::InvalidBaseUrl(cli.base_url.clone()));
        }

        Ok(StartupConfig {
            cache_interval: Duration::from_millis(cli.cache_interval_ms),
            base_url: base_url.to_string(),
            seed: cli.seed,
            verbose: cli.verbose,
        })
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "pokedex=debug,warn"
        } else {
            "pokedex=warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["pokedex"]);
        assert_eq!(cli.cache_interval_ms, DEFAULT_CACHE_INTERVAL_MS);
        assert_eq!(cli.base_url, DEFAULT_BASE_URL);
        assert!(cli.seed.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_all_args() {
        let cli = Cli::parse_from([
            "pokedex",
            "--cache-interval-ms",
            "250",
            "--base-url",
            "http://localhost:8000/api/v2/",
            "--seed",
            "42",
            "-v",
        ]);
        assert_eq!(cli.cache_interval_ms, 250);
        assert_eq!(cli.base_url, "http://localhost:8000/api/v2/");
        assert_eq!(cli.seed, Some(42));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_rejects_non_numeric_interval() {
        let result = Cli::try_parse_from(["pokedex", "--cache-interval-ms", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_startup_config_default_matches_cli_defaults() {
        let cli = Cli::parse_from(["pokedex"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config, StartupConfig::default());
        assert_eq!(config.cache_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_startup_config_trims_base_url() {
        let cli = Cli::parse_from(["pokedex", "--base-url", "http://localhost:8000/api/v2/"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/api/v2");
    }

    #[test]
    fn test_startup_config_rejects_zero_interval() {
        let cli = Cli::parse_from(["pokedex", "--cache-interval-ms", "0"]);
        let err = StartupConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, CliError::InvalidInterval(0)));
        assert!(err.to_string().contains("Invalid cache interval"));
    }

    #[test]
    fn test_startup_config_rejects_empty_base_url() {
        let cli = Cli::parse_from(["pokedex", "--base-url", " / "]);
        let result = StartupConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_log_filter_follows_verbose() {
        let quiet = StartupConfig::default();
        assert_eq!(quiet.log_filter(), "pokedex=warn");

        let verbose = StartupConfig {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(verbose.log_filter(), "pokedex=debug,warn");
    }
}
