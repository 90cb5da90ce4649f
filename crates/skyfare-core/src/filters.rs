// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Route search form: free-text inputs turned into a [`FlightFilters`].

use chrono::{NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{City, FlightFilters};
use crate::reference::ReferenceData;

/// Inputs shorter than this get no suggestions.
pub const MIN_SUGGESTION_CHARS: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Please enter both origin and destination")]
    Incomplete,
    #[error("City list is still loading, try again shortly")]
    CitiesNotLoaded,
    #[error("Origin not found: {0}")]
    OriginNotFound(String),
    #[error("Destination not found: {0}")]
    DestinationNotFound(String),
    #[error("Departure date cannot be in the past")]
    PastDate,
    #[error("Return date cannot be before departure date")]
    ReturnBeforeDeparture,
}

fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub struct FilterForm {
    reference: Arc<ReferenceData>,
    today: fn() -> NaiveDate,
    origin_input: String,
    destination_input: String,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    error: Option<FilterError>,
    origin_suggestions: Vec<City>,
    destination_suggestions: Vec<City>,
}

impl FilterForm {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self::with_today(reference, today_utc)
    }

    pub fn with_today(reference: Arc<ReferenceData>, today: fn() -> NaiveDate) -> Self {
        Self {
            reference,
            today,
            origin_input: String::new(),
            destination_input: String::new(),
            departure_date: today(),
            return_date: None,
            error: None,
            origin_suggestions: Vec::new(),
            destination_suggestions: Vec::new(),
        }
    }

    pub fn origin_input(&self) -> &str {
        &self.origin_input
    }

    pub fn destination_input(&self) -> &str {
        &self.destination_input
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn error(&self) -> Option<&FilterError> {
        self.error.as_ref()
    }

    pub fn origin_suggestions(&self) -> &[City] {
        &self.origin_suggestions
    }

    pub fn destination_suggestions(&self) -> &[City] {
        &self.destination_suggestions
    }

    pub fn is_valid(&self) -> bool {
        !self.origin_input.trim().is_empty() && !self.destination_input.trim().is_empty()
    }

    pub fn set_origin(&mut self, input: impl Into<String>) {
        self.origin_input = input.into();
        self.error = None;
        self.origin_suggestions = self.suggestions_for(&self.origin_input);
    }

    pub fn set_destination(&mut self, input: impl Into<String>) {
        self.destination_input = input.into();
        self.error = None;
        self.destination_suggestions = self.suggestions_for(&self.destination_input);
    }

    fn suggestions_for(&self, input: &str) -> Vec<City> {
        if input.chars().count() < MIN_SUGGESTION_CHARS {
            return Vec::new();
        }
        self.reference.search_cities(input)
    }

    /// Rejects days before today. A return date earlier than the new
    /// departure is dropped.
    pub fn set_departure_date(&mut self, date: NaiveDate) -> Result<(), FilterError> {
        let today = (self.today)();
        if date < today {
            warn!(target: "ui", "Attempted to set past date — selected_date={} today={}", date, today);
            return Err(self.fail(FilterError::PastDate));
        }
        self.error = None;
        self.departure_date = date;
        if self.return_date.is_some_and(|r| r < date) {
            self.return_date = None;
        }
        info!(target: "ui", "Departure date set — date={}", date);
        Ok(())
    }

    pub fn set_return_date(&mut self, date: Option<NaiveDate>) -> Result<(), FilterError> {
        let Some(date) = date else {
            self.return_date = None;
            return Ok(());
        };
        if date < self.departure_date {
            warn!(
                target: "ui",
                "Return date before departure date — return_date={} departure_date={}",
                date,
                self.departure_date
            );
            return Err(self.fail(FilterError::ReturnBeforeDeparture));
        }
        self.error = None;
        self.return_date = Some(date);
        Ok(())
    }

    /// Fills the form from existing filters, showing localized city names
    /// where the code is known. `None` resets the form.
    pub fn load_filters(&mut self, filters: Option<&FlightFilters>) {
        let Some(filters) = filters else {
            self.reset();
            return;
        };
        let display = |code: &str| {
            self.reference
                .find_localized_city_name(code)
                .unwrap_or_else(|| code.to_string())
        };
        self.origin_input = display(&filters.origin);
        self.destination_input = display(&filters.destination);
        self.departure_date = filters.departure_date;
        self.return_date = filters.return_date;
        self.error = None;
    }

    pub fn reset(&mut self) {
        self.origin_input.clear();
        self.destination_input.clear();
        self.departure_date = (self.today)();
        self.return_date = None;
        self.error = None;
        self.origin_suggestions.clear();
        self.destination_suggestions.clear();
        info!(target: "ui", "Filters reset to defaults");
    }

    pub fn create_filters(&mut self) -> Result<FlightFilters, FilterError> {
        if !self.is_valid() {
            return Err(self.fail(FilterError::Incomplete));
        }
        if !self.reference.has_cities() {
            return Err(self.fail(FilterError::CitiesNotLoaded));
        }

        let origin_input = self.origin_input.trim().to_string();
        let Some(origin) = self.convert_input_to_code(&origin_input) else {
            return Err(self.fail(FilterError::OriginNotFound(origin_input)));
        };
        let destination_input = self.destination_input.trim().to_string();
        let Some(destination) = self.convert_input_to_code(&destination_input) else {
            return Err(self.fail(FilterError::DestinationNotFound(destination_input)));
        };

        self.error = None;
        Ok(FlightFilters::new(
            origin.to_uppercase(),
            destination.to_uppercase(),
            self.departure_date,
            self.return_date,
        ))
    }

    /// City lookup, then airport name/code, then a bare three-letter code.
    fn convert_input_to_code(&self, input: &str) -> Option<String> {
        if input.is_empty() {
            return None;
        }
        if let Some(code) = self.reference.find_city_code(input) {
            return Some(code);
        }

        let lower = input.to_lowercase();
        if let Some(airport) = self
            .reference
            .search_airports(input)
            .into_iter()
            .find(|a| a.name.to_lowercase() == lower || a.code.to_lowercase() == lower)
        {
            return Some(airport.code);
        }

        if input.chars().count() == 3 && input.chars().all(char::is_alphabetic) {
            return Some(input.to_string());
        }
        None
    }

    fn fail(&mut self, error: FilterError) -> FilterError {
        self.error = Some(error.clone());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticSource;
    use crate::cache::MemoryCache;
    use crate::models::Airport;
    use skyfare_lexicon::CityTranslator;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 10).unwrap()
    }

    fn city(code: &str, name: &str) -> City {
        City {
            code: code.into(),
            name: name.into(),
            country_code: "RU".into(),
            timezone: None,
            coordinates: None,
            name_translations: None,
        }
    }

    fn form(cities: Vec<City>) -> FilterForm {
        let source = StaticSource {
            cities,
            airports: vec![Airport {
                code: "VKO".into(),
                name: "Vnukovo".into(),
                city_code: Some("MOW".into()),
                city_name: Some("Moscow".into()),
                country_code: None,
                country_name: None,
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
        FilterForm::with_today(Arc::new(data), fixed_today)
    }

    #[test]
    fn test_create_filters_resolves_inputs() {
        let mut form = form(vec![city("MOW", "Moscow"), city("LED", "Saint Petersburg")]);
        form.set_origin("Москва");
        form.set_destination(" Санкт-Петербург ");
        let filters = form.create_filters().unwrap();
        assert_eq!(filters.origin, "MOW");
        assert_eq!(filters.destination, "LED");
        assert_eq!(filters.departure_date, fixed_today());

        form.set_origin("vnukovo");
        form.set_destination("xyz");
        let filters = form.create_filters().unwrap();
        assert_eq!(filters.origin, "VKO");
        assert_eq!(filters.destination, "XYZ");
    }

    #[test]
    fn test_create_filters_errors() {
        let mut form = form(vec![city("MOW", "Moscow")]);
        form.set_origin("Moscow");
        assert_eq!(form.create_filters(), Err(FilterError::Incomplete));
        assert_eq!(form.error(), Some(&FilterError::Incomplete));

        form.set_destination("Atlantis");
        assert!(form.error().is_none());
        assert_eq!(
            form.create_filters(),
            Err(FilterError::DestinationNotFound("Atlantis".into()))
        );

        let mut empty = self::form(vec![]);
        empty.set_origin("MOW");
        empty.set_destination("LED");
        assert_eq!(empty.create_filters(), Err(FilterError::CitiesNotLoaded));
    }

    #[test]
    fn test_date_rules() {
        let mut form = form(vec![city("MOW", "Moscow")]);
        let past = NaiveDate::from_ymd_opt(2026, 6, 9).unwrap();
        assert_eq!(form.set_departure_date(past), Err(FilterError::PastDate));
        assert_eq!(form.departure_date(), fixed_today());

        let ret = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        form.set_return_date(Some(ret)).unwrap();
        form.set_departure_date(NaiveDate::from_ymd_opt(2026, 6, 20).unwrap()).unwrap();
        assert_eq!(form.return_date(), None);

        assert_eq!(
            form.set_return_date(Some(ret)),
            Err(FilterError::ReturnBeforeDeparture)
        );
        form.set_return_date(None).unwrap();
    }

    #[test]
    fn test_suggestions_and_load() {
        let mut form = form(vec![city("MOW", "Moscow"), city("MSQ", "Minsk")]);
        form.set_origin("m");
        assert!(form.origin_suggestions().is_empty());
        form.set_origin("mo");
        assert_eq!(form.origin_suggestions()[0].code, "MOW");

        let filters = FlightFilters::new("MOW", "QQQ", fixed_today(), None);
        form.load_filters(Some(&filters));
        assert_eq!(form.origin_input(), "Москва");
        assert_eq!(form.destination_input(), "QQQ");

        form.load_filters(None);
        assert!(form.origin_input().is_empty());
        assert!(form.origin_suggestions().is_empty());
    }
}
