//! In-process fakes for the service traits, used by pipeline tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::{
    error::StageError,
    model::{CityQuery, Coordinates, CountryCode, EventListing, WeatherObservation},
    provider::{CompletionMode, EventsService, TextCompletionProvider, WeatherService},
};

/// Replays scripted replies in order; the last one repeats once the script runs out.
#[derive(Debug)]
pub struct FakeCompletion {
    replies: Mutex<Vec<Result<String, StageError>>>,
    calls: Mutex<Vec<(String, CompletionMode)>>,
}

impl FakeCompletion {
    pub fn new(replies: Vec<Result<String, StageError>>) -> Self {
        Self { replies: Mutex::new(replies), calls: Mutex::new(Vec::new()) }
    }

    pub fn always(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<(String, CompletionMode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletionProvider for FakeCompletion {
    async fn complete(&self, prompt: &str, mode: CompletionMode) -> Result<String, StageError> {
        self.calls.lock().unwrap().push((prompt.to_string(), mode));

        let mut replies = self.replies.lock().unwrap();
        match replies.len() {
            0 => Err(StageError::Malformed("no scripted reply".to_string())),
            1 => replies[0].clone(),
            _ => replies.remove(0),
        }
    }
}

#[derive(Debug)]
pub struct FakeWeather {
    pub hits: Result<Vec<Coordinates>, StageError>,
    pub observation: Result<WeatherObservation, StageError>,
    pub geocode_calls: Mutex<Vec<(String, String)>>,
    pub weather_calls: Mutex<Vec<(f64, f64)>>,
}

impl FakeWeather {
    pub fn new(
        hits: Result<Vec<Coordinates>, StageError>,
        observation: Result<WeatherObservation, StageError>,
    ) -> Self {
        Self {
            hits,
            observation,
            geocode_calls: Mutex::new(Vec::new()),
            weather_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn geocode_count(&self) -> usize {
        self.geocode_calls.lock().unwrap().len()
    }

    pub fn weather_count(&self) -> usize {
        self.weather_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WeatherService for FakeWeather {
    async fn geocode(
        &self,
        city_name: &str,
        country_code: &CountryCode,
        _limit: u32,
    ) -> Result<Vec<Coordinates>, StageError> {
        self.geocode_calls
            .lock()
            .unwrap()
            .push((city_name.to_string(), country_code.to_string()));
        self.hits.clone()
    }

    async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherObservation, StageError> {
        self.weather_calls.lock().unwrap().push((lat, lon));
        self.observation.clone()
    }
}

#[derive(Debug)]
pub struct FakeEvents {
    pub listings: Result<Vec<EventListing>, StageError>,
    pub calls: Mutex<Vec<(CityQuery, String)>>,
}

impl FakeEvents {
    pub fn new(listings: Result<Vec<EventListing>, StageError>) -> Self {
        Self { listings, calls: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EventsService for FakeEvents {
    async fn search_events(
        &self,
        query: &CityQuery,
        country_code: &CountryCode,
    ) -> Result<Vec<EventListing>, StageError> {
        self.calls.lock().unwrap().push((query.clone(), country_code.to_string()));
        self.listings.clone()
    }
}

pub fn paris_observation() -> WeatherObservation {
    use chrono::{NaiveDate, NaiveTime};

    WeatherObservation {
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        location_name: Some("Paris".into()),
        country: Some("FR".into()),
        condition_main: Some("Clear".into()),
        condition_description: "Clear Sky".into(),
        temp_c: 19.4,
        feels_like_c: Some(18.9),
        temp_min_c: 15.2,
        temp_max_c: 22.1,
        pressure_hpa: Some(1016.0),
        humidity_pct: Some(58.0),
        wind_speed: Some(3.6),
        wind_deg: Some(250.0),
        cloudiness_pct: Some(0.0),
        visibility_m: Some(10000.0),
        sunrise: NaiveTime::from_hms_opt(3, 47, 3).unwrap(),
        sunset: NaiveTime::from_hms_opt(19, 28, 0).unwrap(),
    }
}
