//! Core library for trip enrichment.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Adapters for the language model, geocoding/weather and events services
//! - The destination resolution chain and its orchestrator
//! - Shared domain models and the trip lookup seam
//!
//! It is used by `tripinfo-cli`, but can also be embedded in a web backend.

pub mod config;
pub mod country;
pub mod enrich;
pub mod error;
pub mod model;
pub mod provider;
pub mod summary;
pub mod trip;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use enrich::Enricher;
pub use error::{DateRangeError, StageError, TripError};
pub use model::{
    CityQuery, Coordinates, CountryCode, EnrichmentResult, EventListing, EventsReport,
    WeatherObservation, WeatherReport, WeatherSummary,
};
pub use provider::{
    CompletionMode, EventsService, ServiceId, TextCompletionProvider, WeatherService,
};
pub use trip::{InMemoryTripStore, Trip, TripStore};
