// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use log::{debug, error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{Airline, Airport, City, Country, FlightSearchParameters};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("No internet connection: {0}")]
    NoConnection(String),
    #[error("Request timeout: {0}")]
    Timeout(String),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("HTTP error with status code: {0}")]
    Http(u16),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Data decoding failed: {0}")]
    Decode(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ApiError {
    /// Log target used when reporting this error.
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::NoConnection(_) | ApiError::InvalidUrl(_) | ApiError::Http(_) => "network",
            ApiError::InvalidToken(_) | ApiError::Timeout(_) => "api",
            ApiError::Decode(_) => "data",
            ApiError::Unknown(_) => "general",
        }
    }

    pub fn log(&self) {
        error!(target: self.category(), "{}", self);
    }

    fn from_status(status: u16) -> Self {
        if status == 401 {
            ApiError::InvalidToken("API token is invalid or expired".to_string())
        } else {
            ApiError::Http(status)
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(e.to_string())
        } else if e.is_connect() {
            ApiError::NoConnection(e.to_string())
        } else if e.is_builder() {
            ApiError::InvalidUrl(e.to_string())
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::from_status(status.as_u16())
        } else {
            ApiError::Unknown(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CheapestTickets,
    Countries,
    Cities,
    Airports,
    Airlines,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::CheapestTickets => "/v1/prices/cheap",
            Endpoint::Countries => "/data/countries.json",
            Endpoint::Cities => "/data/cities.json",
            Endpoint::Airports => "/data/airports.json",
            Endpoint::Airlines => "/data/airlines.json",
        }
    }
}

/// Envelope returned by the price endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheapTicket {
    pub price: u32,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub flight_number: Option<u32>,
    #[serde(default)]
    pub departure_at: Option<String>,
    #[serde(default)]
    pub return_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// destination code → (offer index → ticket)
pub type CheapTickets = HashMap<String, HashMap<String, CheapTicket>>;

/// Remote source of the four reference collections.
pub trait ReferenceSource: Send + Sync {
    fn load_airports(&self) -> Result<Vec<Airport>, ApiError>;
    fn load_airlines(&self) -> Result<Vec<Airline>, ApiError>;
    fn load_cities(&self) -> Result<Vec<City>, ApiError>;
    fn load_countries(&self) -> Result<Vec<Country>, ApiError>;
}

/// Serves fixed collections. Used for tests and fixtures.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub airports: Vec<Airport>,
    pub airlines: Vec<Airline>,
    pub cities: Vec<City>,
    pub countries: Vec<Country>,
}

impl ReferenceSource for StaticSource {
    fn load_airports(&self) -> Result<Vec<Airport>, ApiError> {
        Ok(self.airports.clone())
    }

    fn load_airlines(&self) -> Result<Vec<Airline>, ApiError> {
        Ok(self.airlines.clone())
    }

    fn load_cities(&self) -> Result<Vec<City>, ApiError> {
        Ok(self.cities.clone())
    }

    fn load_countries(&self) -> Result<Vec<Country>, ApiError> {
        Ok(self.countries.clone())
    }
}

/// Always unreachable; forces every collection onto its cached copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl ReferenceSource for OfflineSource {
    fn load_airports(&self) -> Result<Vec<Airport>, ApiError> {
        Err(ApiError::NoConnection("offline mode".to_string()))
    }

    fn load_airlines(&self) -> Result<Vec<Airline>, ApiError> {
        Err(ApiError::NoConnection("offline mode".to_string()))
    }

    fn load_cities(&self) -> Result<Vec<City>, ApiError> {
        Err(ApiError::NoConnection("offline mode".to_string()))
    }

    fn load_countries(&self) -> Result<Vec<Country>, ApiError> {
        Err(ApiError::NoConnection("offline mode".to_string()))
    }
}

pub struct TravelApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl TravelApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn url(&self, endpoint: Endpoint, params: &[(String, String)]) -> Result<reqwest::Url, ApiError> {
        let raw = format!("{}{}", self.base_url, endpoint.path());
        let url = if params.is_empty() {
            reqwest::Url::parse(&raw)
        } else {
            reqwest::Url::parse_with_params(&raw, params)
        };
        url.map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    fn request<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(String, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint, params)?;

        let response = self
            .client
            .get(url)
            .header("X-Access-Token", &self.token)
            .header("Content-Type", "application/json")
            .send()
            .map_err(|e| {
                error!(target: "network", "Network request failed — url={} error={}", endpoint.path(), e);
                ApiError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16()));
        }

        let body = response.text()?;
        debug!(
            target: "api",
            "API response received — url={} response_size={} preview={}",
            endpoint.path(),
            body.len(),
            body.chars().take(500).collect::<String>()
        );

        serde_json::from_str(&body).map_err(|e| {
            error!(target: "api", "Failed to decode API response — url={} error={}", endpoint.path(), e);
            ApiError::Decode(format!("Failed to decode response: {}", e))
        })
    }

    /// Cheapest tickets for a route. Not used by the listing pipeline.
    pub fn search_cheapest(
        &self,
        params: &FlightSearchParameters,
    ) -> Result<ApiResponse<CheapTickets>, ApiError> {
        let query = params.query_parameters(&self.token);
        self.request(Endpoint::CheapestTickets, &query)
    }
}

impl ReferenceSource for TravelApiClient {
    fn load_airports(&self) -> Result<Vec<Airport>, ApiError> {
        let airports: Vec<Airport> = self.request(Endpoint::Airports, &[])?;
        info!(target: "data", "Airports data loaded — count={}", airports.len());
        Ok(airports)
    }

    fn load_airlines(&self) -> Result<Vec<Airline>, ApiError> {
        let airlines: Vec<Airline> = self.request(Endpoint::Airlines, &[])?;
        info!(target: "data", "Airlines data loaded — count={}", airlines.len());
        Ok(airlines)
    }

    fn load_cities(&self) -> Result<Vec<City>, ApiError> {
        let cities: Vec<City> = self.request(Endpoint::Cities, &[])?;
        info!(target: "data", "Cities data loaded — count={}", cities.len());
        Ok(cities)
    }

    fn load_countries(&self) -> Result<Vec<Country>, ApiError> {
        let countries: Vec<Country> = self.request(Endpoint::Countries, &[])?;
        info!(target: "data", "Countries data loaded — count={}", countries.len());
        Ok(countries)
    }
}
