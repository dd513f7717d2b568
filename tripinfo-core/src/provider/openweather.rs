use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    Config,
    error::StageError,
    model::{Coordinates, CountryCode, WeatherObservation},
};

use super::{ServiceId, WeatherService, http_client, truncate_body};

/// OpenWeather direct geocoding plus current-weather client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key(ServiceId::OpenWeather)?;

        Ok(Self {
            api_key: api_key.to_owned(),
            base_url: config.endpoints.openweather.trim_end_matches('/').to_owned(),
            http: http_client(config.timeouts.weather())?,
        })
    }

    async fn get_body(&self, path: &str, query: &[(&str, String)]) -> Result<String, StageError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(path, %status, body = truncate_body(&body), "OpenWeather request failed");
            return Err(StageError::Status(status.as_u16()));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
    temp_min: f64,
    temp_max: f64,
    pressure: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: Option<String>,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    name: Option<String>,
    sys: OwSys,
    weather: Vec<OwWeather>,
    main: OwMain,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    visibility: Option<f64>,
}

impl TryFrom<OwCurrentResponse> for WeatherObservation {
    type Error = StageError;

    fn try_from(raw: OwCurrentResponse) -> Result<Self, StageError> {
        let condition = raw
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| StageError::Malformed("weather array is empty".to_string()))?;

        Ok(WeatherObservation {
            date: unix_to_utc(raw.dt)?.date_naive(),
            location_name: raw.name,
            country: raw.sys.country,
            condition_main: condition.main,
            condition_description: title_case(&condition.description),
            temp_c: raw.main.temp,
            feels_like_c: raw.main.feels_like,
            temp_min_c: raw.main.temp_min,
            temp_max_c: raw.main.temp_max,
            pressure_hpa: raw.main.pressure,
            humidity_pct: raw.main.humidity,
            wind_speed: raw.wind.speed,
            wind_deg: raw.wind.deg,
            cloudiness_pct: raw.clouds.all,
            visibility_m: raw.visibility,
            sunrise: unix_to_utc(raw.sys.sunrise)?.time(),
            sunset: unix_to_utc(raw.sys.sunset)?.time(),
        })
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn geocode(
        &self,
        city_name: &str,
        country_code: &CountryCode,
        limit: u32,
    ) -> Result<Vec<Coordinates>, StageError> {
        let query = [
            ("q", format!("{city_name},{country_code}")),
            ("limit", limit.to_string()),
        ];
        let body = self.get_body("/geo/1.0/direct", &query).await?;

        let hits: Vec<Coordinates> = serde_json::from_str(&body)
            .map_err(|e| StageError::Malformed(format!("geocoding JSON: {e}")))?;

        debug!(city_name, %country_code, hits = hits.len(), "geocoded");
        Ok(hits)
    }

    async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherObservation, StageError> {
        let query = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("units", "metric".to_string()),
        ];
        let body = self.get_body("/data/2.5/weather", &query).await?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| StageError::Malformed(format!("current weather JSON: {e}")))?;

        WeatherObservation::try_from(parsed)
    }
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, StageError> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .ok_or_else(|| StageError::Malformed(format!("timestamp {ts} out of range")))
}

/// Uppercase the first letter of every word, lowercase the rest.
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;

    for ch in text.chars() {
        if prev_is_letter {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        prev_is_letter = ch.is_alphabetic();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherReport;
    use chrono::{NaiveDate, NaiveTime};
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> OpenWeatherClient {
        let mut cfg = Config::default();
        cfg.upsert_api_key(ServiceId::OpenWeather, "OWM".into());
        cfg.endpoints.openweather = server.url();
        OpenWeatherClient::from_config(&cfg).unwrap()
    }

    fn paris_payload() -> serde_json::Value {
        json!({
            "dt": 1748779200,
            "name": "Paris",
            "sys": { "country": "FR", "sunrise": 1748749623, "sunset": 1748806080 },
            "weather": [{ "main": "Clouds", "description": "broken clouds" }],
            "main": {
                "temp": 19.4, "feels_like": 18.9, "temp_min": 15.2, "temp_max": 22.1,
                "pressure": 1016, "humidity": 58
            },
            "wind": { "speed": 3.6, "deg": 250 },
            "clouds": { "all": 75 },
            "visibility": 10000
        })
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("broken clouds"), "Broken Clouds");
        assert_eq!(title_case("LIGHT rain"), "Light Rain");
        assert_eq!(title_case("thunderstorm with drizzle-rain"), "Thunderstorm With Drizzle-Rain");
        assert_eq!(title_case(""), "");
    }

    #[tokio::test]
    async fn geocode_sends_city_and_country() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/geo/1.0/direct")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Paris,FR".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
                Matcher::UrlEncoded("appid".into(), "OWM".into()),
            ]))
            .with_status(200)
            .with_body(json!([{ "name": "Paris", "lat": 48.85, "lon": 2.35 }]).to_string())
            .create_async()
            .await;

        let code = CountryCode::parse("FR").unwrap();
        let hits = client_for(&server).geocode("Paris", &code, 1).await.unwrap();

        assert_eq!(hits, vec![Coordinates::new(48.85, 2.35)]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn geocode_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/geo/1.0/direct")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let code = CountryCode::parse("FR").unwrap();
        let err = client_for(&server).geocode("Paris", &code, 1).await.unwrap_err();
        assert_eq!(err, StageError::Status(401));
    }

    #[tokio::test]
    async fn current_weather_maps_full_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lat".into(), "48.85".into()),
                Matcher::UrlEncoded("lon".into(), "2.35".into()),
                Matcher::UrlEncoded("units".into(), "metric".into()),
            ]))
            .with_status(200)
            .with_body(paris_payload().to_string())
            .create_async()
            .await;

        let obs = client_for(&server).current_weather(48.85, 2.35).await.unwrap();

        assert_eq!(obs.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(obs.location_name.as_deref(), Some("Paris"));
        assert_eq!(obs.country.as_deref(), Some("FR"));
        assert_eq!(obs.condition_description, "Broken Clouds");
        assert_eq!(obs.temp_max_c, 22.1);
        assert_eq!(obs.humidity_pct, Some(58.0));
        assert_eq!(obs.sunrise, NaiveTime::from_hms_opt(3, 47, 3).unwrap());
        assert_eq!(obs.sunset, NaiveTime::from_hms_opt(19, 28, 0).unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_required_field_is_malformed() {
        let mut payload = paris_payload();
        payload["sys"].as_object_mut().unwrap().remove("sunset");

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(payload.to_string())
            .create_async()
            .await;

        let err = client_for(&server).current_weather(48.85, 2.35).await.unwrap_err();
        assert!(matches!(err, StageError::Malformed(_)));
    }

    #[tokio::test]
    async fn optional_blocks_may_be_absent() {
        let mut payload = paris_payload();
        let obj = payload.as_object_mut().unwrap();
        obj.remove("wind");
        obj.remove("clouds");
        obj.remove("visibility");

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(payload.to_string())
            .create_async()
            .await;

        let obs = client_for(&server).current_weather(48.85, 2.35).await.unwrap();
        assert_eq!(obs.wind_speed, None);
        assert_eq!(obs.cloudiness_pct, None);
        assert_eq!(obs.visibility_m, None);
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stalled = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut cfg = Config::default();
        cfg.upsert_api_key(ServiceId::OpenWeather, "OWM".into());
        cfg.endpoints.openweather = format!("http://{addr}");
        cfg.timeouts.weather_secs = 1;
        let client = OpenWeatherClient::from_config(&cfg).unwrap();

        let started = tokio::time::Instant::now();
        let err = client.current_weather(48.85, 2.35).await.unwrap_err();
        assert_eq!(err, StageError::Timeout);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));

        let report = crate::enrich::fetch_weather(&client, Coordinates::new(48.85, 2.35)).await;
        assert_eq!(report, WeatherReport::Unavailable("Weather API error timeout".into()));
        assert_eq!(serde_json::to_value(&report).unwrap(), json!(["Weather API error timeout"]));

        stalled.abort();
    }
}
