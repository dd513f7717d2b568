use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    model::CountryCode,
    provider::{CompletionMode, TextCompletionProvider},
};

pub const MAX_ATTEMPTS: usize = 3;

/// Maps a free-text city name to the most likely country via the language model.
#[derive(Debug, Clone)]
pub struct CountryResolver {
    llm: Arc<dyn TextCompletionProvider>,
    max_attempts: usize,
}

impl CountryResolver {
    pub fn new(llm: Arc<dyn TextCompletionProvider>) -> Self {
        Self { llm, max_attempts: MAX_ATTEMPTS }
    }

    /// `None` means the location could not be resolved; that is a normal outcome.
    pub async fn resolve(&self, city_name: &str) -> Option<CountryCode> {
        let prompt = country_prompt(city_name);

        for attempt in 1..=self.max_attempts {
            match self.llm.complete(&prompt, CompletionMode::Json).await {
                Ok(reply) => {
                    if let Some(code) = parse_country_reply(&reply) {
                        debug!(city_name, %code, attempt, "country resolved");
                        return Some(code);
                    }
                    debug!(city_name, attempt, reply = %reply, "rejected country reply");
                }
                Err(err) => debug!(city_name, attempt, %err, "country lookup failed"),
            }
        }

        info!(city_name, attempts = self.max_attempts, "location unresolved");
        None
    }
}

pub fn country_prompt(city_name: &str) -> String {
    format!(
        "Act as a location expert. Given a city name, respond ONLY with a JSON object containing \
         the 2-letter country code of the most likely country for that city, using the field \
         'country_code'. If you cannot determine the country confidently, respond with a string \
         'false'. If the city name is empty, respond with a string 'false'. Do not return any \
         explanation, only the JSON object or false. City: {city_name}"
    )
}

/// Accepts only `{"country_code": "<two chars>"}`.
pub fn parse_country_reply(reply: &str) -> Option<CountryCode> {
    let value: Value = serde_json::from_str(reply.trim()).ok()?;
    let code = value.get("country_code")?.as_str()?;
    CountryCode::parse(code)
}
