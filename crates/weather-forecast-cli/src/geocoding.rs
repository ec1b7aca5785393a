use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::model::GeocodedLocation;
use crate::providers::GeocodingApi;
use crate::store::{Loaded, Store, StoreError};

/// Query string to resolved location; entries never expire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeocodingCache {
    entries: BTreeMap<String, GeocodedLocation>,
}

impl GeocodingCache {
    pub fn load_from<S>(store: &S) -> Result<Self, StoreError>
    where
        S: Store<Self>,
    {
        match store.load()? {
            Loaded::Found(cache) => Ok(cache),
            Loaded::Missing => Ok(Self::default()),
            Loaded::Corrupted(detail) => {
                tracing::warn!(%detail, "geocoding cache is corrupted, starting empty");
                Ok(Self::default())
            }
        }
    }

    pub fn get(&self, query: &str) -> Option<&GeocodedLocation> {
        self.entries.get(query)
    }

    pub fn set(&mut self, query: impl Into<String>, location: GeocodedLocation) {
        self.entries.insert(query.into(), location);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn resolve_location<A, S>(
    api: &A,
    cache: &mut GeocodingCache,
    store: &S,
    access_key: &str,
    query: &str,
) -> Result<GeocodedLocation, AppError>
where
    A: GeocodingApi,
    S: Store<GeocodingCache>,
{
    if let Some(location) = cache.get(query) {
        tracing::debug!(query, "geocoding cache hit");
        return Ok(location.clone());
    }

    tracing::debug!(query, "geocoding cache miss");
    let location = api.geocode(access_key, query)?;
    cache.set(query, location.clone());
    store.save(cache)?;
    tracing::info!(query, entries = cache.len(), "geocoding cache saved");

    Ok(location)
}
