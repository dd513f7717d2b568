use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Debug, fs, path::Path};

use crate::model::CityQuery;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

impl Trip {
    /// Dates are passed through unchecked; a reversed window only empties the events.
    pub fn city_query(&self) -> CityQuery {
        CityQuery {
            city_name: self.destination.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Read access to stored trips.
#[async_trait]
pub trait TripStore: Send + Sync + Debug {
    async fn find_trip(&self, id: u64) -> Option<Trip>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTripStore {
    trips: HashMap<u64, Trip>,
}

impl InMemoryTripStore {
    pub fn new(trips: impl IntoIterator<Item = Trip>) -> Self {
        Self { trips: trips.into_iter().map(|t| (t.id, t)).collect() }
    }

    /// Load a JSON array of trips.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read trips file: {}", path.display()))?;

        let trips: Vec<Trip> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse trips file: {}", path.display()))?;

        Ok(Self::new(trips))
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn find_trip(&self, id: u64) -> Option<Trip> {
        self.trips.get(&id).cloned()
    }
}
