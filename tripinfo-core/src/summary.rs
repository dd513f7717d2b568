use std::sync::Arc;

use tracing::warn;

use crate::{
    model::{WeatherObservation, WeatherSummary},
    provider::{CompletionMode, TextCompletionProvider},
};

/// Turns a weather observation into one short paragraph of prose.
#[derive(Debug, Clone)]
pub struct Summarizer {
    llm: Arc<dyn TextCompletionProvider>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn TextCompletionProvider>) -> Self {
        Self { llm }
    }

    /// Single attempt. A failed or empty completion yields `None`.
    pub async fn summarize(&self, observation: &WeatherObservation) -> Option<WeatherSummary> {
        let prompt = summary_prompt(observation);

        match self.llm.complete(&prompt, CompletionMode::Text).await {
            Ok(text) if !text.trim().is_empty() => {
                Some(WeatherSummary { text: text.trim().to_string() })
            }
            Ok(_) => {
                warn!("weather summary came back empty");
                None
            }
            Err(err) => {
                warn!(%err, "weather summary failed");
                None
            }
        }
    }
}

pub fn summary_prompt(obs: &WeatherObservation) -> String {
    format!(
        "Write a natural-sounding weather summary for location = {location}, country = {country}, \
         with a high of temp_max = {high}°C, low of temp_min = {low}°C, sunrise = {sunrise}, and \
         sunset = {sunset}. Keep it under 70 words, no bullet points, no repetition. Just one \
         short paragraph.",
        location = obs.location_name.as_deref().unwrap_or("unknown"),
        country = obs.country.as_deref().unwrap_or("unknown"),
        high = obs.temp_max_c,
        low = obs.temp_min_c,
        sunrise = obs.sunrise.format("%H:%M:%S"),
        sunset = obs.sunset.format("%H:%M:%S"),
    )
}
