// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod api;
pub mod cache;
pub mod config;
pub mod detail;
pub mod events;
pub mod filters;
pub mod flight_gen;
pub mod formatting;
pub mod listing;
pub mod models;
pub mod reference;
pub mod status;

use std::path::PathBuf;
use thiserror::Error;

pub use api::{ApiError, ReferenceSource, TravelApiClient};
pub use cache::{CacheStore, FileCache, MemoryCache, ReferenceCache};
pub use config::AppConfig;
pub use detail::FlightDetail;
pub use filters::{FilterError, FilterForm};
pub use flight_gen::FlightGenerator;
pub use formatting::Formatter;
pub use listing::{FlightListing, FlightSource, ListingSnapshot, ListingState};
pub use models::{Airline, Airport, City, Country, Flight, FlightFilters, FlightSearchParameters};
pub use reference::ReferenceData;
pub use status::FlightStatus;

/// Failures surfaced by a flight listing load.
#[derive(Error, Debug)]
pub enum SkyfareError {
    #[error("Reference data not loaded: {0}")]
    NotLoaded(String),
    #[error("Flight generation failed: {0}")]
    Generation(String),
}

/// Per-user configuration directory, e.g. `~/.config/skyfare` on Linux.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "skyfare", "SkyFare")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".skyfare"))
}

/// Default location of the reference data cache.
pub fn get_cache_root() -> PathBuf {
    directories::ProjectDirs::from("org", "skyfare", "SkyFare")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| get_config_root().join("cache"))
}
