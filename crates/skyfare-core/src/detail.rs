// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use chrono::{DateTime, Utc};
use log::debug;

use crate::formatting::{self, Formatter};
use crate::models::{Airline, Airport, Flight};
use crate::status::FlightStatus;

/// A flight joined with its reference entities and display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightDetail {
    pub flight: Flight,
    pub origin_airport: Option<Airport>,
    pub destination_airport: Option<Airport>,
    pub airline: Option<Airline>,
    pub flight_number: String,
    pub origin_name: String,
    pub destination_name: String,
    pub airline_name: String,
    pub price: String,
    pub departure_date: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub changes: String,
}

impl FlightDetail {
    /// Airports match on airport code or city code; airline on code.
    pub fn resolve(flight: Flight, formatter: &Formatter) -> Self {
        let airports = formatter.reference().airports();
        let matching = |code: &str| {
            airports
                .iter()
                .find(|a| a.code == code || a.city_code.as_deref() == Some(code))
                .cloned()
        };
        let origin_airport = matching(&flight.origin);
        let destination_airport = matching(&flight.destination);
        let airline = flight
            .airline
            .as_deref()
            .and_then(|code| formatter.reference().find_airline(code));

        debug!(
            target: "flight",
            "Flight details resolved — origin_airport={} destination_airport={} airline={}",
            origin_airport.as_ref().map_or("Not found", |a| a.name.as_str()),
            destination_airport.as_ref().map_or("Not found", |a| a.name.as_str()),
            airline.as_ref().map_or("Not found", |a| a.name.as_str())
        );

        let location = |code: &str, airport: Option<&Airport>| match airport {
            Some(a) if a.code == code => a.name.clone(),
            _ => formatter
                .reference()
                .find_city_name(code)
                .unwrap_or_else(|| code.to_string()),
        };

        Self {
            flight_number: flight.flight_number(),
            origin_name: location(&flight.origin, origin_airport.as_ref()),
            destination_name: location(&flight.destination, destination_airport.as_ref()),
            airline_name: formatter.format_airline(Some(flight.airline_code())),
            price: formatter.format_price(flight.price),
            departure_date: formatting::format_display_date(flight.depart_date),
            departure_time: formatting::format_time(flight.departure_time()),
            arrival_time: formatting::format_time(flight.arrival_time()),
            duration: formatting::format_duration(flight.block_time().num_minutes().max(0) as u32),
            changes: formatting::format_changes(flight.number_of_changes),
            flight,
            origin_airport,
            destination_airport,
            airline,
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> FlightStatus {
        self.flight.status_at(now)
    }

    pub fn status(&self) -> FlightStatus {
        self.flight.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticSource;
    use crate::cache::MemoryCache;
    use crate::models::City;
    use crate::reference::ReferenceData;
    use chrono::{Duration, NaiveDate};
    use skyfare_lexicon::CityTranslator;
    use std::sync::Arc;

    #[test]
    fn test_resolve_by_city_code() {
        let source = StaticSource {
            airports: vec![Airport {
                code: "SVO".into(),
                name: "Sheremetyevo".into(),
                city_code: Some("MOW".into()),
                city_name: Some("Moscow".into()),
                country_code: None,
                country_name: None,
                timezone: None,
                coordinates: None,
                name_translations: None,
            }],
            cities: vec![City {
                code: "MOW".into(),
                name: "Moscow".into(),
                country_code: "RU".into(),
                timezone: None,
                coordinates: None,
                name_translations: None,
            }],
            ..StaticSource::default()
        };
        let data = ReferenceData::new(
            Arc::new(source),
            Arc::new(MemoryCache::new()),
            Arc::new(CityTranslator::new()),
        );
        data.load_all();
        let formatter = Formatter::new(Arc::new(data), "ru", "RUB");

        let now = Utc::now();
        let flight = Flight {
            price: 12500,
            trip_class: 0,
            show_to_affiliates: true,
            origin: "MOW".into(),
            destination: "LED".into(),
            gate_id: None,
            depart_date: NaiveDate::from_ymd_opt(2026, 7, 4).unwrap(),
            return_date: None,
            number_of_changes: 1,
            found_at: now,
            duration: Some(95),
            distance: 650,
            actual: true,
            expires_at: now + Duration::hours(2),
            airline: Some("DP".into()),
        };

        let detail = FlightDetail::resolve(flight, &formatter);
        assert_eq!(detail.origin_airport.as_ref().map(|a| a.code.as_str()), Some("SVO"));
        assert!(detail.destination_airport.is_none());
        assert!(detail.airline.is_none());
        // Matched through the city code, so the name comes from the city.
        assert_eq!(detail.origin_name, "Moscow");
        assert_eq!(detail.destination_name, "LED");
        assert_eq!(detail.airline_name, "Победа");
        assert_eq!(detail.price, "12 500 ₽");
        assert_eq!(detail.departure_time, "00:00");
        assert_eq!(detail.arrival_time, "01:35");
        assert_eq!(detail.duration, "1h 35m");
        assert_eq!(detail.changes, "1 stop");
        assert!(detail.flight_number.starts_with("DP"));
    }
}
