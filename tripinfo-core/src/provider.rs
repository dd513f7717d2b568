use crate::{
    Config,
    error::StageError,
    model::{CityQuery, Coordinates, CountryCode, EventListing, WeatherObservation},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod openai;
pub mod openweather;
pub mod ticketmaster;

/// External services that need credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    Ticketmaster,
    OpenAi,
    OpenWeather,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Ticketmaster => "ticketmaster",
            ServiceId::OpenAi => "openai",
            ServiceId::OpenWeather => "openweather",
        }
    }

    /// Environment variable that overrides the stored key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ServiceId::Ticketmaster => "TICKETMASTER_API_KEY",
            ServiceId::OpenAi => "OPENAI_API_KEY",
            ServiceId::OpenWeather => "WEATHER_API_KEY",
        }
    }

    pub const fn all() -> &'static [ServiceId] {
        &[ServiceId::Ticketmaster, ServiceId::OpenAi, ServiceId::OpenWeather]
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServiceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "ticketmaster" => Ok(ServiceId::Ticketmaster),
            "openai" => Ok(ServiceId::OpenAi),
            "openweather" => Ok(ServiceId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown service '{value}'. Supported services: ticketmaster, openai, openweather."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    Text,
    /// Ask the model to emit a single JSON object.
    Json,
}

/// A generative language model reduced to prompt in, raw text out.
#[async_trait]
pub trait TextCompletionProvider: Send + Sync + Debug {
    async fn complete(&self, prompt: &str, mode: CompletionMode) -> Result<String, StageError>;
}

/// Geocoding and current conditions.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    async fn geocode(
        &self,
        city_name: &str,
        country_code: &CountryCode,
        limit: u32,
    ) -> Result<Vec<Coordinates>, StageError>;

    async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherObservation, StageError>;
}

/// Ticketing/events discovery.
#[async_trait]
pub trait EventsService: Send + Sync + Debug {
    async fn search_events(
        &self,
        query: &CityQuery,
        country_code: &CountryCode,
    ) -> Result<Vec<EventListing>, StageError>;
}

pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder().timeout(timeout).build().context("Failed to build HTTP client")
}

pub(crate) fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Build all three adapters from config, failing if any key is missing.
pub fn services_from_config(
    config: &Config,
) -> anyhow::Result<(openai::OpenAiProvider, openweather::OpenWeatherClient, ticketmaster::TicketmasterClient)>
{
    let llm = openai::OpenAiProvider::from_config(config)?;
    let weather = openweather::OpenWeatherClient::from_config(config)?;
    let events = ticketmaster::TicketmasterClient::from_config(config)?;
    Ok((llm, weather, events))
}
