// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Synthetic fare generation from cached reference data.
//!
//! There is no live pricing feed behind the listing; offers are invented
//! from the airports and airlines the store holds. Output is random by
//! design: the same request can yield a different set and count each time.
//! Inject a seeded RNG (and a fixed clock) when a reproducible set is needed.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::listing::FlightSource;
use crate::models::{Airline, Airport, Flight, FlightFilters};
use crate::reference::ReferenceData;
use crate::SkyfareError;

const MAX_ORIGIN_AIRPORTS: usize = 25;
const MAX_DESTINATION_INDEX: usize = 30;
const FALLBACK_AIRPORT_COUNT: usize = 30;

const FLIGHTS_PER_ROUTE: RangeInclusive<u32> = 2..=4;
const PRICE_RANGE: RangeInclusive<u32> = 4000..=20000;
const DURATION_RANGE: RangeInclusive<u32> = 60..=300;
const CHANGES_RANGE: RangeInclusive<u8> = 0..=2;
const DAYS_OFFSET_RANGE: RangeInclusive<u64> = 1..=7;
const DISTANCE_RANGE: RangeInclusive<u32> = 200..=3000;
const EXPIRATION_HOURS: i64 = 1;

const ROUTE_FLIGHTS: RangeInclusive<u32> = 3..=8;
const ROUTE_PRICE_RANGE: RangeInclusive<u32> = 3000..=25000;
const ROUTE_DURATION_RANGE: RangeInclusive<u32> = 60..=420;
const ROUTE_DAYS_OFFSET: RangeInclusive<u64> = 0..=6;
const ROUTE_HOURS_OFFSET: RangeInclusive<i64> = 6..=23;
const ROUTE_DISTANCE_RANGE: RangeInclusive<u32> = 200..=2500;
const ROUTE_EXPIRATION_HOURS: i64 = 2;

/// How long an unfiltered run waits for airports/airlines to arrive.
const READY_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);

/// Hubs used for the unfiltered listing, in priority order.
pub const POPULAR_AIRPORT_CODES: [&str; 70] = [
    "MOW", "LED", "AER", "KZN", "UFA", "ROV", "KRR", "VOG", "SVX", "OVB", // Russia
    "JFK", "LAX", "ORD", "DFW", "DEN", "ATL", "BOS", "SFO", "SEA", "MIA", // US
    "LHR", "CDG", "FRA", "AMS", "MAD", "FCO", "LGW", "MUC", "ZUR", "VIE", // Europe
    "DXB", "DOH", "AUH", "CAI", "JED", "RUH", "KWI", "BAH", "MCT", "AMM", // Middle East
    "NRT", "ICN", "SIN", "BKK", "HKG", "PVG", "PEK", "DEL", "BOM", "CCU", // Asia
    "CMB", "CGK", "KUL", "MNL", "TPE", "HAN", "SGN", "RGN", "DAD", "CAN",
    "SYD", "MEL", "YYZ", "YVR", "GRU", "EZE", "LIM", "BOG", "SCL", "PTY",
];

/// Which lookup resolved a free-text airport query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirportMatch {
    Code,
    CityName,
    CityNameContains,
    AirportNameContains,
}

pub struct FlightGenerator<R = StdRng> {
    reference: Arc<ReferenceData>,
    rng: R,
    clock: fn() -> DateTime<Utc>,
}

impl FlightGenerator<StdRng> {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self::with_rng(reference, StdRng::from_entropy())
    }

    pub fn seeded(reference: Arc<ReferenceData>, seed: u64) -> Self {
        Self::with_rng(reference, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> FlightGenerator<R> {
    pub fn with_rng(reference: Arc<ReferenceData>, rng: R) -> Self {
        Self {
            reference,
            rng,
            clock: Utc::now,
        }
    }

    /// Replaces the wall clock used for `found_at` and departure offsets.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Offers between popular airports, cheapest first.
    pub fn generate_all(&mut self) -> Vec<Flight> {
        info!(target: "flight", "Generating flights from cached static data");

        let airports = self.available_airports();
        let airlines = self.available_airlines();

        if airports.is_empty() || airlines.is_empty() {
            warn!(
                target: "flight",
                "No airports or airlines available for flight generation — airports_count={} airlines_count={}",
                airports.len(),
                airlines.len()
            );
            return Vec::new();
        }

        let now = (self.clock)();
        let mut flights = Vec::new();
        let origin_limit = airports.len().min(MAX_ORIGIN_AIRPORTS);
        let destination_limit = airports.len().min(MAX_DESTINATION_INDEX);

        for i in 0..origin_limit {
            for j in (i + 1)..destination_limit {
                self.push_route(&mut flights, &airports[i], &airports[j], &airlines, (i, j), now);
            }
        }

        flights.sort_by_key(|f| f.price);

        info!(
            target: "flight",
            "Generated flights from cached data — flights_count={} airports_used={} airlines_available={}",
            flights.len(),
            airports.len(),
            airlines.len()
        );
        flights
    }

    fn push_route(
        &mut self,
        out: &mut Vec<Flight>,
        origin: &Airport,
        destination: &Airport,
        airlines: &[Airline],
        route: (usize, usize),
        now: DateTime<Utc>,
    ) {
        let count = self.rng.gen_range(FLIGHTS_PER_ROUTE);
        for k in 0..count {
            let airline = airlines.choose(&mut self.rng).map(|a| a.code.clone());
            let days = self.rng.gen_range(DAYS_OFFSET_RANGE);
            let depart_date = now
                .date_naive()
                .checked_add_days(Days::new(days))
                .unwrap_or_else(|| now.date_naive());

            out.push(Flight {
                price: self.rng.gen_range(PRICE_RANGE),
                trip_class: 0,
                show_to_affiliates: true,
                origin: origin.code.clone(),
                destination: destination.code.clone(),
                gate_id: Some(format!("gate_{}_{}_{}", route.0, route.1, k)),
                depart_date,
                return_date: None,
                number_of_changes: self.rng.gen_range(CHANGES_RANGE),
                found_at: now,
                duration: Some(self.rng.gen_range(DURATION_RANGE)),
                distance: self.rng.gen_range(DISTANCE_RANGE),
                actual: true,
                expires_at: now + Duration::hours(EXPIRATION_HOURS),
                airline,
            });
        }
    }

    /// Offers for one route. Empty when either end cannot be resolved.
    pub fn generate_filtered(&mut self, filters: &FlightFilters) -> Vec<Flight> {
        info!(
            target: "flight",
            "Generating filtered flights from cached data — origin={} destination={}",
            filters.origin,
            filters.destination
        );

        let (origin, destination) = match (
            self.resolve_airport(&filters.origin),
            self.resolve_airport(&filters.destination),
        ) {
            (Some((o, _)), Some((d, _))) => (o, d),
            _ => {
                warn!(
                    target: "flight",
                    "Airports not found in cache — origin={} destination={} available_airports_count={}",
                    filters.origin,
                    filters.destination,
                    self.reference.airports().len()
                );
                return Vec::new();
            }
        };

        let airlines = self.available_airlines();
        let now = (self.clock)();
        let count = self.rng.gen_range(ROUTE_FLIGHTS);
        let mut flights = Vec::with_capacity(count as usize);

        for k in 0..count {
            let airline = airlines.choose(&mut self.rng).map(|a| a.code.clone());
            let days = self.rng.gen_range(ROUTE_DAYS_OFFSET);
            let hours = self.rng.gen_range(ROUTE_HOURS_OFFSET);
            let depart_date = offset_date(filters.departure_date, days, hours);

            flights.push(Flight {
                price: self.rng.gen_range(ROUTE_PRICE_RANGE),
                trip_class: 0,
                show_to_affiliates: true,
                origin: filters.origin.trim().to_uppercase(),
                destination: filters.destination.trim().to_uppercase(),
                gate_id: Some(format!("cached_{}", k)),
                depart_date,
                return_date: filters.return_date,
                number_of_changes: self.rng.gen_range(CHANGES_RANGE),
                found_at: now,
                duration: Some(self.rng.gen_range(ROUTE_DURATION_RANGE)),
                distance: self.rng.gen_range(ROUTE_DISTANCE_RANGE),
                actual: true,
                expires_at: now + Duration::hours(ROUTE_EXPIRATION_HOURS),
                airline,
            });
        }

        flights.sort_by_key(|f| f.price);
        info!(
            target: "flight",
            "Generated route flights — origin={} destination={} flights_count={}",
            origin.code,
            destination.code,
            flights.len()
        );
        flights
    }

    /// Curated hubs present in the store, else the first airports that have
    /// a city name.
    fn available_airports(&self) -> Vec<Airport> {
        let all = self.reference.airports();
        let popular: Vec<Airport> = POPULAR_AIRPORT_CODES
            .iter()
            .filter_map(|code| all.iter().find(|a| a.code == *code).cloned())
            .collect();

        if !popular.is_empty() {
            return popular;
        }

        all.into_iter()
            .filter(|a| a.city().is_some())
            .take(FALLBACK_AIRPORT_COUNT)
            .collect()
    }

    fn available_airlines(&self) -> Vec<Airline> {
        self.reference
            .airlines()
            .into_iter()
            .filter(|a| !a.name.is_empty())
            .collect()
    }

    /// Code, exact city name, city name substring, airport name substring.
    pub fn resolve_airport(&self, query: &str) -> Option<(Airport, AirportMatch)> {
        let term = query.trim().to_uppercase();
        if term.is_empty() {
            return None;
        }
        let airports = self.reference.airports();
        let city_upper = |a: &Airport| a.city_name.as_deref().map(str::to_uppercase);

        let found = airports
            .iter()
            .find(|a| a.code.to_uppercase() == term)
            .map(|a| (a, AirportMatch::Code))
            .or_else(|| {
                airports
                    .iter()
                    .find(|a| city_upper(a).as_deref() == Some(term.as_str()))
                    .map(|a| (a, AirportMatch::CityName))
            })
            .or_else(|| {
                airports
                    .iter()
                    .find(|a| city_upper(a).is_some_and(|c| c.contains(&term)))
                    .map(|a| (a, AirportMatch::CityNameContains))
            })
            .or_else(|| {
                airports
                    .iter()
                    .find(|a| a.name.to_uppercase().contains(&term))
                    .map(|a| (a, AirportMatch::AirportNameContains))
            });

        match found {
            Some((airport, strategy)) => {
                info!(
                    target: "flight",
                    "Airport found — search_term={} strategy={:?} found_airport={} city={}",
                    term,
                    strategy,
                    airport.code,
                    airport.city_name.as_deref().unwrap_or("N/A")
                );
                Some((airport.clone(), strategy))
            }
            None => {
                warn!(
                    target: "flight",
                    "Airport not found — search_term={} total_airports={}",
                    term,
                    airports.len()
                );
                None
            }
        }
    }
}

fn offset_date(date: NaiveDate, days: u64, hours: i64) -> NaiveDate {
    let base = date.checked_add_days(Days::new(days)).unwrap_or(date);
    (base.and_time(chrono::NaiveTime::MIN) + Duration::hours(hours)).date()
}

impl<R: Rng> FlightSource for FlightGenerator<R> {
    fn generate_all(&mut self) -> Result<Vec<Flight>, SkyfareError> {
        if !self.reference.is_ready() {
            info!(
                target: "flight",
                "Waiting for static data to load — timeout_ms={}",
                READY_TIMEOUT.as_millis()
            );
            if !self.reference.wait_until_ready(READY_TIMEOUT) {
                return Err(SkyfareError::NotLoaded(
                    "airports and airlines are not available yet".to_string(),
                ));
            }
        }
        Ok(FlightGenerator::generate_all(self))
    }

    fn generate_filtered(&mut self, filters: &FlightFilters) -> Result<Vec<Flight>, SkyfareError> {
        Ok(FlightGenerator::generate_filtered(self, filters))
    }
}
