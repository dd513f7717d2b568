use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    Config,
    error::StageError,
    model::{CityQuery, CountryCode, EventListing},
};

use super::{EventsService, ServiceId, http_client, truncate_body};

pub const MAX_EVENTS: usize = 10;

/// Ticketmaster Discovery API client.
#[derive(Debug, Clone)]
pub struct TicketmasterClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl TicketmasterClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key(ServiceId::Ticketmaster)?;

        Ok(Self {
            api_key: api_key.to_owned(),
            base_url: config.endpoints.ticketmaster.trim_end_matches('/').to_owned(),
            http: http_client(config.timeouts.events())?,
        })
    }
}

/// Full-day inclusive UTC window for the discovery query.
pub fn date_window(start: NaiveDate, end: NaiveDate) -> (String, String) {
    (
        start.format("%Y-%m-%dT00:00:00Z").to_string(),
        end.format("%Y-%m-%dT23:59:59Z").to_string(),
    )
}

#[derive(Debug, Default, Deserialize)]
struct TmSearchResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<TmEmbedded>,
}

#[derive(Debug, Default, Deserialize)]
struct TmEmbedded {
    #[serde(default)]
    events: Vec<TmEvent>,
}

#[derive(Debug, Deserialize)]
struct TmEvent {
    name: String,
    url: Option<String>,
    #[serde(default)]
    dates: TmDates,
}

#[derive(Debug, Default, Deserialize)]
struct TmDates {
    #[serde(default)]
    start: TmStart,
}

#[derive(Debug, Default, Deserialize)]
struct TmStart {
    #[serde(rename = "localDate")]
    local_date: Option<String>,
}

impl From<TmEvent> for EventListing {
    fn from(event: TmEvent) -> Self {
        EventListing {
            name: event.name,
            date: event.dates.start.local_date.unwrap_or_default(),
            url: event.url,
        }
    }
}

#[async_trait]
impl EventsService for TicketmasterClient {
    async fn search_events(
        &self,
        query: &CityQuery,
        country_code: &CountryCode,
    ) -> Result<Vec<EventListing>, StageError> {
        let url = format!("{}/discovery/v2/events.json", self.base_url);
        let (start, end) = date_window(query.start_date, query.end_date);
        let size = MAX_EVENTS.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("keyword", query.city_name.as_str()),
                ("countryCode", country_code.as_str()),
                ("startDateTime", start.as_str()),
                ("endDateTime", end.as_str()),
                ("size", size.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(%status, body = truncate_body(&body), "Ticketmaster request failed");
            return Err(StageError::Status(status.as_u16()));
        }

        let parsed: TmSearchResponse = serde_json::from_str(&body)
            .map_err(|e| StageError::Malformed(format!("discovery JSON: {e}")))?;

        let listings: Vec<EventListing> = parsed
            .embedded
            .unwrap_or_default()
            .events
            .into_iter()
            .take(MAX_EVENTS)
            .map(EventListing::from)
            .collect();

        debug!(city = %query.city_name, %country_code, found = listings.len(), "events fetched");
        Ok(listings)
    }
}
