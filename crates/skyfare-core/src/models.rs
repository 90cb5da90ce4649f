// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::status::{self, FlightStatus};

pub const DEFAULT_CURRENCY: &str = "RUB";
pub const DEFAULT_LANGUAGE: &str = "ru";

/// The reference API occasionally sends `null` for codes and names.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Shared surface of the four reference collections.
pub trait ReferenceEntity {
    fn code(&self) -> &str;
    fn name(&self) -> &str;
    fn name_translations(&self) -> Option<&HashMap<String, String>>;

    /// Name in `language`, falling back to the default name.
    fn localized_name(&self, language: &str) -> &str {
        self.name_translations()
            .and_then(|t| t.get(language))
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub city_code: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default, alias = "time_zone")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub name_translations: Option<HashMap<String, String>>,
}

impl Airport {
    /// City name if present and non-blank.
    pub fn city(&self) -> Option<&str> {
        self.city_name.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airline {
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub name_translations: Option<HashMap<String, String>>,
    #[serde(default)]
    pub is_lowcost: Option<bool>,
    #[serde(default)]
    pub alliance_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country_code: String,
    #[serde(default, alias = "time_zone")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub name_translations: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub name_translations: Option<HashMap<String, String>>,
}

macro_rules! reference_entity {
    ($($ty:ty),*) => {
        $(impl ReferenceEntity for $ty {
            fn code(&self) -> &str {
                &self.code
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn name_translations(&self) -> Option<&HashMap<String, String>> {
                self.name_translations.as_ref()
            }
        })*
    };
}

reference_entity!(Airport, Airline, City, Country);

/// One synthetic fare offer. Field names follow the fare API wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(rename = "value")]
    pub price: u32,
    pub trip_class: u8,
    pub show_to_affiliates: bool,
    pub origin: String,
    pub destination: String,
    pub gate_id: Option<String>,
    pub depart_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub number_of_changes: u8,
    pub found_at: DateTime<Utc>,
    pub duration: Option<u32>,
    pub distance: u32,
    pub actual: bool,
    pub expires_at: DateTime<Utc>,
    pub airline: Option<String>,
}

impl Flight {
    /// Departure instant; the fare API only carries a date, read as 00:00 UTC.
    pub fn departure_time(&self) -> DateTime<Utc> {
        self.depart_date.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    pub fn arrival_time(&self) -> DateTime<Utc> {
        status::arrival_time(self.departure_time(), self.duration)
    }

    pub fn flight_number(&self) -> String {
        status::flight_number(self.airline.as_deref(), &self.origin, &self.destination)
    }

    pub fn airline_code(&self) -> &str {
        self.airline.as_deref().unwrap_or("XX")
    }

    pub fn is_round_trip(&self) -> bool {
        self.return_date.is_some()
    }

    /// Status as seen at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> FlightStatus {
        status::derive_status(
            self.departure_time(),
            self.arrival_time(),
            now,
            &self.flight_number(),
        )
    }

    /// Status as seen right now. Two calls may disagree if the clock crosses
    /// a window boundary in between.
    pub fn status(&self) -> FlightStatus {
        self.status_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn block_time(&self) -> Duration {
        self.arrival_time() - self.departure_time()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightFilters {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
}

impl FlightFilters {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: NaiveDate,
        return_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure_date,
            return_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchParameters {
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    pub currency: String,
    pub language: String,
}

impl FlightSearchParameters {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, depart_date: NaiveDate) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            depart_date,
            return_date: None,
            currency: DEFAULT_CURRENCY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_return_date(mut self, date: Option<NaiveDate>) -> Self {
        self.return_date = date;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Query string pairs for the cheapest-tickets endpoint.
    pub fn query_parameters(&self, token: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("origin".to_string(), self.origin.clone()),
            ("destination".to_string(), self.destination.clone()),
            ("depart_date".to_string(), self.depart_date.format("%Y-%m-%d").to_string()),
            ("currency".to_string(), self.currency.clone()),
            ("token".to_string(), token.to_string()),
        ];
        if let Some(ret) = self.return_date {
            params.push(("return_date".to_string(), ret.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

impl From<&FlightFilters> for FlightSearchParameters {
    fn from(filters: &FlightFilters) -> Self {
        FlightSearchParameters::new(
            filters.origin.clone(),
            filters.destination.clone(),
            filters.departure_date,
        )
        .with_return_date(filters.return_date)
    }
}
