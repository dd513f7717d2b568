use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tripinfo_core::{CityQuery, Config, EnrichmentResult, Enricher, InMemoryTripStore, ServiceId};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tripinfo", version, about = "Weather and events for a trip destination")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for a service.
    Configure {
        /// Service short name: "ticketmaster", "openai" or "openweather".
        service: String,
    },

    /// Enrich a destination and date range.
    Enrich {
        /// Free-text city name.
        city: String,

        /// First day of the trip, YYYY-MM-DD.
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the trip (inclusive), YYYY-MM-DD.
        #[arg(long)]
        end: NaiveDate,
    },

    /// Enrich a stored trip by id.
    Trip {
        id: u64,

        /// JSON file holding an array of trips.
        #[arg(long)]
        trips: PathBuf,
    },

    /// Print where the config file lives.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { service } => configure(&service),
            Command::Enrich { city, start, end } => {
                let query = CityQuery::new(city, start, end)?;
                let enricher = Enricher::from_config(&Config::load()?)?;

                let result = cancellable(enricher.enrich(&query)).await?;
                print_result(&result)
            }
            Command::Trip { id, trips } => {
                let store = InMemoryTripStore::from_json_file(&trips)?;
                let enricher = Enricher::from_config(&Config::load()?)?;

                let result = cancellable(enricher.get_external_info(&store, id)).await??;
                print_result(&result)
            }
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn configure(service: &str) -> anyhow::Result<()> {
    let id = ServiceId::try_from(service)?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_help_message(&format!("Can also be supplied through {}", id.env_var()))
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key for {id} must not be empty");
    }

    let path = Config::config_file_path()?;
    store_api_key(&path, id, api_key.trim())?;

    info!(service = %id, "credentials saved");
    println!("Saved {id} credentials to {}", path.display());
    Ok(())
}

/// Reads the file without environment overrides so env-only keys never reach disk.
fn store_api_key(path: &Path, id: ServiceId, api_key: &str) -> anyhow::Result<()> {
    let mut config = Config::load_file_from(path)?;
    config.upsert_api_key(id, api_key.to_string());
    config.save_to(path)
}

/// Drops `fut`, aborting any in-flight requests, when Ctrl-C arrives first.
async fn cancellable<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    tokio::select! {
        output = fut => Ok(output),
        _ = tokio::signal::ctrl_c() => bail!("Cancelled"),
    }
}

fn print_result(result: &EnrichmentResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    println!("{json}");
    Ok(())
}
