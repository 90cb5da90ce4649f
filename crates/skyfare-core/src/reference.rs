// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Cache-backed reference data: airports, airlines, cities and countries.
//!
//! Collections are pre-populated from the local cache on construction and
//! overwritten by [`ReferenceData::load_all`] on a successful fetch. A failed
//! fetch falls back to the cached copy of that collection only.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use skyfare_lexicon::CityTranslator;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::api::{ApiError, ReferenceSource};
use crate::cache::{
    CacheStore, ReferenceCache, AIRLINES_KEY, AIRPORTS_KEY, CITIES_KEY, COUNTRIES_KEY,
    RECENT_SEARCHES_KEY,
};
use crate::events::Subscribers;
use crate::models::{Airline, Airport, City, Country, FlightSearchParameters};

pub const MAX_RECENT_SEARCHES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Airports,
    Airlines,
    Cities,
    Countries,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Airports,
        Collection::Airlines,
        Collection::Cities,
        Collection::Countries,
    ];

    pub fn cache_key(&self) -> &'static str {
        match self {
            Collection::Airports => AIRPORTS_KEY,
            Collection::Airlines => AIRLINES_KEY,
            Collection::Cities => CITIES_KEY,
            Collection::Countries => COUNTRIES_KEY,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Collection::Airports => "airports",
            Collection::Airlines => "airlines",
            Collection::Cities => "cities",
            Collection::Countries => "countries",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Cache,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceEvent {
    Updated {
        collection: Collection,
        source: UpdateSource,
        count: usize,
    },
    RecentSearches {
        count: usize,
    },
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct ReferenceData {
    source: Arc<dyn ReferenceSource>,
    cache: ReferenceCache,
    translator: Arc<CityTranslator>,
    airports: RwLock<Vec<Airport>>,
    airlines: RwLock<Vec<Airline>>,
    cities: RwLock<Vec<City>>,
    countries: RwLock<Vec<Country>>,
    recent_searches: RwLock<Vec<FlightSearchParameters>>,
    events: Subscribers<ReferenceEvent>,
}

impl ReferenceData {
    /// Creates the store and restores every collection from `store`.
    pub fn new(
        source: Arc<dyn ReferenceSource>,
        store: Arc<dyn CacheStore>,
        translator: Arc<CityTranslator>,
    ) -> Self {
        let data = Self {
            source,
            cache: ReferenceCache::new(store),
            translator,
            airports: RwLock::new(Vec::new()),
            airlines: RwLock::new(Vec::new()),
            cities: RwLock::new(Vec::new()),
            countries: RwLock::new(Vec::new()),
            recent_searches: RwLock::new(Vec::new()),
            events: Subscribers::new(),
        };
        data.load_cached_data();
        data
    }

    pub fn translator(&self) -> &CityTranslator {
        &self.translator
    }

    pub fn subscribe(&self) -> Receiver<ReferenceEvent> {
        self.events.subscribe()
    }

    /// Fetches all four collections concurrently. Never fails: a collection
    /// whose fetch fails keeps (or is restored to) its cached copy.
    pub fn load_all(&self) {
        let started = Instant::now();
        rayon::scope(|s| {
            s.spawn(|_| self.refresh(Collection::Airports, |src| src.load_airports(), &self.airports));
            s.spawn(|_| self.refresh(Collection::Airlines, |src| src.load_airlines(), &self.airlines));
            s.spawn(|_| self.refresh(Collection::Cities, |src| src.load_cities(), &self.cities));
            s.spawn(|_| {
                self.refresh(Collection::Countries, |src| src.load_countries(), &self.countries)
            });
        });
        info!(
            target: "cache",
            "Reference data load finished — airports={} airlines={} cities={} countries={} elapsed_ms={}",
            read(&self.airports).len(),
            read(&self.airlines).len(),
            read(&self.cities).len(),
            read(&self.countries).len(),
            started.elapsed().as_millis()
        );
    }

    fn refresh<T, F>(&self, collection: Collection, fetch: F, slot: &RwLock<Vec<T>>)
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&dyn ReferenceSource) -> Result<Vec<T>, ApiError>,
    {
        match fetch(self.source.as_ref()) {
            Ok(items) => {
                self.cache_data(&items, collection.cache_key());
                let count = items.len();
                *write(slot) = items;
                info!(
                    target: "cache",
                    "{} loaded and cached — count={}",
                    collection.label(),
                    count
                );
                self.events.publish(&ReferenceEvent::Updated {
                    collection,
                    source: UpdateSource::Remote,
                    count,
                });
            }
            Err(e) => {
                e.log();
                warn!(target: "cache", "Falling back to cached {} data", collection.label());
                self.restore(collection, slot);
            }
        }
    }

    /// Serializes `data` under `key`. Failures are logged, never raised.
    pub fn cache_data<T: Serialize>(&self, data: &[T], key: &str) {
        if let Err(e) = self.cache.store(key, data) {
            log::error!(target: "cache", "Failed to cache data — key={} error={:#}", key, e);
        }
    }

    /// Restores one collection from cache. Returns false (and leaves the
    /// in-memory collection untouched) when nothing usable is cached.
    pub fn load_cached(&self, collection: Collection) -> bool {
        match collection {
            Collection::Airports => self.restore(collection, &self.airports),
            Collection::Airlines => self.restore(collection, &self.airlines),
            Collection::Cities => self.restore(collection, &self.cities),
            Collection::Countries => self.restore(collection, &self.countries),
        }
    }

    fn restore<T: DeserializeOwned>(&self, collection: Collection, slot: &RwLock<Vec<T>>) -> bool {
        let Some(items) = self.cache.load::<Vec<T>>(collection.cache_key()) else {
            return false;
        };
        let count = items.len();
        *write(slot) = items;
        info!(
            target: "cache",
            "Loaded {} from cache — count={}",
            collection.label(),
            count
        );
        self.events.publish(&ReferenceEvent::Updated {
            collection,
            source: UpdateSource::Cache,
            count,
        });
        true
    }

    fn load_cached_data(&self) {
        for collection in Collection::ALL {
            self.load_cached(collection);
        }
        if let Some(searches) = self
            .cache
            .load::<Vec<FlightSearchParameters>>(RECENT_SEARCHES_KEY)
        {
            info!(target: "cache", "Loaded recent searches from cache — count={}", searches.len());
            *write(&self.recent_searches) = searches;
        }
    }

    pub fn airports(&self) -> Vec<Airport> {
        read(&self.airports).clone()
    }

    pub fn airlines(&self) -> Vec<Airline> {
        read(&self.airlines).clone()
    }

    pub fn cities(&self) -> Vec<City> {
        read(&self.cities).clone()
    }

    pub fn countries(&self) -> Vec<Country> {
        read(&self.countries).clone()
    }

    pub fn recent_searches(&self) -> Vec<FlightSearchParameters> {
        read(&self.recent_searches).clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.cache.last_updated()
    }

    /// Airports and airlines are both available for flight synthesis.
    pub fn is_ready(&self) -> bool {
        !read(&self.airports).is_empty() && !read(&self.airlines).is_empty()
    }

    pub fn has_cities(&self) -> bool {
        !read(&self.cities).is_empty()
    }

    /// Blocks until [`is_ready`](Self::is_ready) or `timeout` elapses.
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        let rx = self.subscribe();
        let deadline = Instant::now() + timeout;
        while !self.is_ready() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return self.is_ready()
                }
            }
        }
        true
    }

    pub fn find_airport(&self, code: &str) -> Option<Airport> {
        read(&self.airports).iter().find(|a| a.code == code).cloned()
    }

    pub fn find_airline(&self, code: &str) -> Option<Airline> {
        read(&self.airlines).iter().find(|a| a.code == code).cloned()
    }

    pub fn find_country(&self, code: &str) -> Option<Country> {
        read(&self.countries)
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned()
    }

    /// Case-insensitive substring match on code, name or city name.
    pub fn search_airports(&self, query: &str) -> Vec<Airport> {
        let airports = read(&self.airports);
        if query.is_empty() {
            return airports.clone();
        }
        let q = query.to_lowercase();
        airports
            .iter()
            .filter(|a| {
                a.code.to_lowercase().contains(&q)
                    || a.name.to_lowercase().contains(&q)
                    || a.city_name
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&q))
            })
            .cloned()
            .collect()
    }

    /// Translation-table hits first, then direct code/name matches.
    pub fn search_cities(&self, query: &str) -> Vec<City> {
        let cities = read(&self.cities);
        if query.is_empty() {
            return cities.clone();
        }
        let q = query.to_lowercase();
        let mut results: Vec<City> = Vec::new();

        for pair in self.translator.search(&q) {
            if let Some(city) = cities.iter().find(|c| c.name.to_lowercase() == pair.canonical) {
                if !results.iter().any(|r| r.code == city.code) {
                    results.push(city.clone());
                }
            }
        }

        for city in cities
            .iter()
            .filter(|c| c.code.to_lowercase().contains(&q) || c.name.to_lowercase().contains(&q))
        {
            if !results.iter().any(|r| r.code == city.code) {
                results.push(city.clone());
            }
        }

        results
    }

    /// Resolves a free-text city name: translated name, exact name, name
    /// prefix, then exact code.
    pub fn find_city_code(&self, name: &str) -> Option<String> {
        let trimmed = name.trim();
        let lower = trimmed.to_lowercase();
        let cities = read(&self.cities);

        if let Some(canonical) = self.translator.to_canonical(trimmed) {
            if let Some(city) = cities.iter().find(|c| c.name.to_lowercase() == canonical) {
                debug!("City resolved via translation — input={} code={}", trimmed, city.code);
                return Some(city.code.clone());
            }
        }

        cities
            .iter()
            .find(|c| c.name.to_lowercase() == lower)
            .or_else(|| cities.iter().find(|c| c.name.to_lowercase().starts_with(&lower)))
            .or_else(|| cities.iter().find(|c| c.code.to_lowercase() == lower))
            .map(|c| c.code.clone())
    }

    pub fn find_city_name(&self, code: &str) -> Option<String> {
        read(&self.cities)
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .map(|c| c.name.clone())
    }

    /// Localized name for a city code, falling back to the canonical name.
    pub fn find_localized_city_name(&self, code: &str) -> Option<String> {
        let name = self.find_city_name(code)?;
        Some(self.translator.to_localized(&name).unwrap_or(name))
    }

    /// Moves `params` to the front of the recent list and persists it.
    pub fn record_search(&self, params: FlightSearchParameters) {
        let snapshot = {
            let mut searches = write(&self.recent_searches);
            searches.retain(|s| *s != params);
            searches.insert(0, params);
            searches.truncate(MAX_RECENT_SEARCHES);
            searches.clone()
        };
        self.cache_data(&snapshot, RECENT_SEARCHES_KEY);
        self.events.publish(&ReferenceEvent::RecentSearches {
            count: snapshot.len(),
        });
    }

    /// Deletes every persisted collection, the recent searches and the
    /// update stamp. In-memory data is left as is.
    pub fn clear_cache(&self) -> anyhow::Result<()> {
        let mut keys: Vec<&str> = Collection::ALL.iter().map(|c| c.cache_key()).collect();
        keys.push(RECENT_SEARCHES_KEY);
        self.cache.clear(&keys)?;
        info!(target: "cache", "Cache cleared — keys={}", keys.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticSource;
    use crate::cache::MemoryCache;
    use chrono::NaiveDate;

    fn city(code: &str, name: &str) -> City {
        City {
            code: code.into(),
            name: name.into(),
            country_code: "XX".into(),
            timezone: None,
            coordinates: None,
            name_translations: None,
        }
    }

    fn store_with(cities: Vec<City>) -> ReferenceData {
        let source = StaticSource {
            cities,
            ..StaticSource::default()
        };
        let data = ReferenceData::new(
            Arc::new(source),
            Arc::new(MemoryCache::new()),
            Arc::new(CityTranslator::new()),
        );
        data.load_all();
        data
    }

    #[test]
    fn test_find_city_code_strategies() {
        let data = store_with(vec![
            city("MOW", "Moscow"),
            city("LED", "Saint Petersburg"),
            city("NYC", "New York"),
            city("PAR", "Paris"),
        ]);

        assert_eq!(data.find_city_code("Москва").as_deref(), Some("MOW"));
        assert_eq!(data.find_city_code("  paris ").as_deref(), Some("PAR"));
        assert_eq!(data.find_city_code("New Y").as_deref(), Some("NYC"));
        assert_eq!(data.find_city_code("led").as_deref(), Some("LED"));
        assert_eq!(data.find_city_code("Atlantis"), None);
    }

    #[test]
    fn test_search_cities_translation_first() {
        let data = store_with(vec![
            city("BER", "Berlin"),
            city("MOW", "Moscow"),
            city("MSQ", "Minsk"),
        ]);

        // "мо" hits the translation table for Moscow only.
        let results = data.search_cities("мо");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].code, "MOW");

        // "m" matches Moscow via both paths; it must appear once.
        let results = data.search_cities("m");
        let moscow = results.iter().filter(|c| c.code == "MOW").count();
        assert_eq!(moscow, 1);
        assert!(results.iter().any(|c| c.code == "MSQ"));

        assert_eq!(data.search_cities("").len(), 3);
    }

    #[test]
    fn test_localized_city_name_fallback() {
        let data = store_with(vec![city("MOW", "Moscow"), city("XYZ", "Nowhere")]);
        assert_eq!(data.find_localized_city_name("mow").as_deref(), Some("Москва"));
        assert_eq!(data.find_localized_city_name("XYZ").as_deref(), Some("Nowhere"));
        assert_eq!(data.find_localized_city_name("QQQ"), None);
    }

    #[test]
    fn test_recent_searches_dedupe_and_cap() {
        let data = store_with(vec![]);
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        for i in 0..12 {
            data.record_search(FlightSearchParameters::new(format!("A{:02}", i), "LED", date));
        }
        data.record_search(FlightSearchParameters::new("A05", "LED", date));

        let recent = data.recent_searches();
        assert_eq!(recent.len(), MAX_RECENT_SEARCHES);
        assert_eq!(recent[0].origin, "A05");
        assert_eq!(recent.iter().filter(|s| s.origin == "A05").count(), 1);
    }
}
