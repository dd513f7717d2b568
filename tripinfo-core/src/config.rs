use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

use crate::provider::ServiceId;

pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const LLM_MODEL_ENV: &str = "TRIPINFO_LLM_MODEL";

/// Credentials for a single external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub api_key: String,
}

/// Base URLs of the external services. Overridden in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub openai: String,
    pub openweather: String,
    pub ticketmaster: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openai: "https://api.openai.com".to_string(),
            openweather: "https://api.openweathermap.org".to_string(),
            ticketmaster: "https://app.ticketmaster.com".to_string(),
        }
    }
}

/// Per-call bounds in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub weather_secs: u64,
    pub llm_secs: u64,
    pub events_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { weather_secs: 8, llm_secs: 15, events_secs: 15 }
    }
}

impl Timeouts {
    pub fn weather(&self) -> Duration {
        Duration::from_secs(self.weather_secs)
    }

    pub fn llm(&self) -> Duration {
        Duration::from_secs(self.llm_secs)
    }

    pub fn events(&self) -> Duration {
        Duration::from_secs(self.events_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Language model used by both prompts; `gpt-4o-mini` when unset.
    pub llm_model: Option<String>,

    /// Example TOML:
    /// [services.openweather]
    /// api_key = "..."
    pub services: HashMap<String, ServiceConfig>,

    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
}

impl Config {
    /// Load config from disk (or an empty default), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// File contents only, without environment overrides. Use this before `save`
    /// so keys supplied through the environment are never written to disk.
    pub fn load_file() -> Result<Self> {
        Self::load_file_from(&Self::config_file_path()?)
    }

    pub fn load_file_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Environment variables win over the file. `lookup` is injected so tests
    /// do not touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in ServiceId::all() {
            if let Some(key) = lookup(id.env_var()).filter(|k| !k.trim().is_empty()) {
                debug!(service = %id, "api key taken from environment");
                self.upsert_api_key(*id, key);
            }
        }

        if let Some(model) = lookup(LLM_MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            self.llm_model = Some(model);
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "tripinfo", "tripinfo")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn upsert_api_key(&mut self, id: ServiceId, api_key: String) {
        self.services.insert(id.as_str().to_string(), ServiceConfig { api_key });
    }

    pub fn api_key(&self, id: ServiceId) -> Option<&str> {
        self.services.get(id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_service_configured(&self, id: ServiceId) -> bool {
        self.api_key(id).is_some()
    }

    pub fn require_api_key(&self, id: ServiceId) -> Result<&str> {
        self.api_key(id).ok_or_else(|| {
            anyhow!(
                "No API key configured for service '{id}'.\n\
                 Hint: run `tripinfo configure {id}` or set {}.",
                id.env_var()
            )
        })
    }

    pub fn llm_model(&self) -> &str {
        self.llm_model.as_deref().unwrap_or(DEFAULT_LLM_MODEL)
    }
}
