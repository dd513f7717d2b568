use chrono::{NaiveDate, NaiveTime};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DateRangeError, StageError};

pub const LOCATION_NOT_FOUND: &str = "Location not found";
pub const NO_EVENTS_FOUND: &str = "No events found";

/// Destination and inclusive calendar-day window of a trip.
///
/// `new` rejects a reversed window; stored trips are taken as they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    pub city_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CityQuery {
    pub fn new(
        city_name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, DateRangeError> {
        if end_date < start_date {
            return Err(DateRangeError { start: start_date, end: end_date });
        }

        Ok(Self { city_name: city_name.into(), start_date, end_date })
    }

    pub fn has_valid_window(&self) -> bool {
        self.start_date <= self.end_date
    }
}

/// Two-character country code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryCode(String);

impl CountryCode {
    /// Accepts any string that is exactly two characters once uppercased.
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.to_uppercase();
        if upper.chars().count() == 2 { Some(Self(upper)) } else { None }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geocoding result. Both fields `None` means the location was not resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat: Some(lat), lon: Some(lon) }
    }

    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Returns the pair only when both halves are present.
    pub fn pair(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    pub location_name: Option<String>,
    pub country: Option<String>,
    pub condition_main: Option<String>,
    pub condition_description: String,
    pub temp_c: f64,
    pub feels_like_c: Option<f64>,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    #[serde(rename = "pressure_hPa")]
    pub pressure_hpa: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub cloudiness_pct: Option<f64>,
    pub visibility_m: Option<f64>,
    /// UTC, serialized as HH:MM:SS.
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

/// Output of the forecast stage: a structured observation or an explanatory
/// placeholder. Serializes as a one-element sequence either way.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherReport {
    Observation(WeatherObservation),
    Unavailable(String),
}

impl WeatherReport {
    pub fn location_not_found() -> Self {
        WeatherReport::Unavailable(LOCATION_NOT_FOUND.to_string())
    }

    pub fn from_error(err: &StageError) -> Self {
        let reason = match err {
            StageError::Status(status) => format!("Weather API error {status}"),
            StageError::Timeout => "Weather API error timeout".to_string(),
            StageError::Transport(_) => "Weather API error unavailable".to_string(),
            StageError::Malformed(_) => "Weather API error malformed response".to_string(),
        };
        WeatherReport::Unavailable(reason)
    }

    pub fn observation(&self) -> Option<&WeatherObservation> {
        match self {
            WeatherReport::Observation(obs) => Some(obs),
            WeatherReport::Unavailable(_) => None,
        }
    }
}

impl Serialize for WeatherReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1))?;
        match self {
            WeatherReport::Observation(obs) => seq.serialize_element(obs)?,
            WeatherReport::Unavailable(reason) => seq.serialize_element(reason)?,
        }
        seq.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    #[serde(rename = "Summary")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventListing {
    pub name: String,
    /// Local date as reported by the provider, `YYYY-MM-DD`.
    pub date: String,
    pub url: Option<String>,
}

/// Events attached to an enrichment result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventsReport {
    /// Lookup never ran because the location was not resolved.
    Skipped,
    Found(Vec<EventListing>),
    NoneFound,
}

impl EventsReport {
    pub fn from_listings(listings: Vec<EventListing>) -> Self {
        if listings.is_empty() {
            EventsReport::NoneFound
        } else {
            EventsReport::Found(listings)
        }
    }

    pub fn listings(&self) -> &[EventListing] {
        match self {
            EventsReport::Found(listings) => listings,
            EventsReport::Skipped | EventsReport::NoneFound => &[],
        }
    }
}

impl Serialize for EventsReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EventsReport::Skipped => serializer.serialize_seq(Some(0))?.end(),
            EventsReport::Found(listings) => listings.serialize(serializer),
            EventsReport::NoneFound => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(NO_EVENTS_FOUND)?;
                seq.end()
            }
        }
    }
}

/// What the caller receives. `weather_interpretation` is omitted when no
/// structured weather could be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult {
    pub events: EventsReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_interpretation: Option<WeatherSummary>,
}

impl EnrichmentResult {
    pub fn unresolved_location() -> Self {
        Self { events: EventsReport::Skipped, weather_interpretation: None }
    }
}
