//! Destination resolution chain and the orchestrator that drives it.
//!
//! city -> country code -> coordinates -> current weather -> summary, with the
//! events lookup running alongside the weather chain once a country is known.
//! Every stage absorbs its own failures, so [`Enricher::enrich`] is infallible.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    Config,
    country::CountryResolver,
    error::TripError,
    model::{
        CityQuery, Coordinates, CountryCode, EnrichmentResult, EventsReport, WeatherReport,
        WeatherSummary,
    },
    provider::{EventsService, TextCompletionProvider, WeatherService, services_from_config},
    summary::Summarizer,
    trip::TripStore,
};

pub const GEOCODE_LIMIT: u32 = 1;

/// First geocoding hit, or unresolved on any failure or an empty result.
pub async fn resolve_coordinates(
    weather: &dyn WeatherService,
    city_name: &str,
    country_code: &CountryCode,
) -> Coordinates {
    match weather.geocode(city_name, country_code, GEOCODE_LIMIT).await {
        Ok(hits) => hits.into_iter().next().unwrap_or_else(|| {
            debug!(city_name, %country_code, "no geocoding results");
            Coordinates::unresolved()
        }),
        Err(err) => {
            warn!(city_name, %country_code, %err, "geocoding failed");
            Coordinates::unresolved()
        }
    }
}

/// Current conditions at `coords`. Unresolved coordinates never hit the network.
pub async fn fetch_weather(weather: &dyn WeatherService, coords: Coordinates) -> WeatherReport {
    let Some((lat, lon)) = coords.pair() else {
        return WeatherReport::location_not_found();
    };

    match weather.current_weather(lat, lon).await {
        Ok(observation) => WeatherReport::Observation(observation),
        Err(err) => {
            warn!(lat, lon, %err, "weather lookup failed");
            WeatherReport::from_error(&err)
        }
    }
}

/// Events in the trip window. Empty results, failures and a reversed window all
/// render as "No events found".
pub async fn fetch_events(
    events: &dyn EventsService,
    query: &CityQuery,
    country_code: &CountryCode,
) -> EventsReport {
    if !query.has_valid_window() {
        debug!(
            city = %query.city_name,
            start = %query.start_date,
            end = %query.end_date,
            "trip window is reversed, skipping events lookup"
        );
        return EventsReport::NoneFound;
    }

    match events.search_events(query, country_code).await {
        Ok(listings) => EventsReport::from_listings(listings),
        Err(err) => {
            warn!(city = %query.city_name, %country_code, %err, "events lookup failed");
            EventsReport::NoneFound
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enricher {
    countries: CountryResolver,
    summarizer: Summarizer,
    weather: Arc<dyn WeatherService>,
    events: Arc<dyn EventsService>,
}

impl Enricher {
    pub fn new(
        llm: Arc<dyn TextCompletionProvider>,
        weather: Arc<dyn WeatherService>,
        events: Arc<dyn EventsService>,
    ) -> Self {
        Self {
            countries: CountryResolver::new(llm.clone()),
            summarizer: Summarizer::new(llm),
            weather,
            events,
        }
    }

    /// Wire up the real HTTP adapters. Fails only when credentials are missing.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let (llm, weather, events) = services_from_config(config)?;
        Ok(Self::new(Arc::new(llm), Arc::new(weather), Arc::new(events)))
    }

    pub async fn enrich(&self, query: &CityQuery) -> EnrichmentResult {
        let Some(country_code) = self.countries.resolve(&query.city_name).await else {
            return EnrichmentResult::unresolved_location();
        };

        let (weather_interpretation, events) = tokio::join!(
            self.weather_chain(&query.city_name, &country_code),
            fetch_events(self.events.as_ref(), query, &country_code),
        );

        info!(
            city = %query.city_name,
            %country_code,
            events = events.listings().len(),
            weather = weather_interpretation.is_some(),
            "enrichment assembled"
        );

        EnrichmentResult { events, weather_interpretation }
    }

    /// Look the trip up and enrich its destination and dates. Only a missing
    /// trip is an error.
    pub async fn get_external_info(
        &self,
        store: &dyn TripStore,
        trip_id: u64,
    ) -> Result<EnrichmentResult, TripError> {
        let trip = store.find_trip(trip_id).await.ok_or(TripError::NotFound(trip_id))?;
        Ok(self.enrich(&trip.city_query()).await)
    }

    async fn weather_chain(
        &self,
        city_name: &str,
        country_code: &CountryCode,
    ) -> Option<WeatherSummary> {
        let coords = resolve_coordinates(self.weather.as_ref(), city_name, country_code).await;

        match fetch_weather(self.weather.as_ref(), coords).await {
            WeatherReport::Observation(observation) => self.summarizer.summarize(&observation).await,
            WeatherReport::Unavailable(reason) => {
                debug!(city_name, reason = %reason, "skipping weather summary");
                None
            }
        }
    }
}
