// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use skyfare_core::api::OfflineSource;
use skyfare_core::flight_gen::FlightGenerator;
use skyfare_core::formatting::{format_changes, format_display_date, format_duration};
use skyfare_core::{
    AppConfig, FileCache, FilterForm, Flight, FlightDetail, FlightListing, FlightSearchParameters,
    FlightSource, Formatter, ReferenceData, ReferenceSource, TravelApiClient,
};
use skyfare_lexicon::CityTranslator;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.json (defaults to the per-user config directory)
    #[arg(long, env = "SKYFARE_CONFIG")]
    config: Option<PathBuf>,

    /// API access token
    #[arg(long, env = "SKYFARE_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API base URL
    #[arg(long, env = "SKYFARE_BASE_URL")]
    base_url: Option<String>,

    /// Reference data cache directory
    #[arg(long, env = "SKYFARE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Never touch the network; use cached reference data only
    #[arg(long)]
    offline: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all reference data and refresh the cache
    Sync,
    /// Search airports by code, name or city
    Airports { query: String },
    /// Search cities, including localized names
    Cities { query: String },
    /// Resolve a city name (any supported language) to its code
    Resolve { name: String },
    /// List generated offers between popular airports
    Flights {
        /// Number of pages to reveal
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Search offers for one route
    Search {
        origin: String,
        destination: String,
        /// Departure date (YYYY-MM-DD), today if omitted
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Return date (YYYY-MM-DD)
        #[arg(short, long = "return", value_parser = parse_date)]
        return_date: Option<NaiveDate>,
        /// Print full details of the cheapest offer
        #[arg(long)]
        details: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show recently searched routes
    Recent,
    /// Translate a city name between its localized and canonical forms
    Translate {
        #[arg(required_unless_present = "list")]
        name: Option<String>,
        /// Print every supported localized name with its canonical form
        #[arg(long)]
        list: bool,
    },
    /// Delete cached reference data and recent searches
    ClearCache,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("hyper")
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load().with_context(|| {
            format!("Failed to load config from {}", AppConfig::default_path().display())
        })?,
    };
    if let Some(token) = &cli.token {
        config.api_token = token.clone();
    }
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    Ok(config)
}

fn open_reference(config: &AppConfig, offline: bool) -> Result<Arc<ReferenceData>> {
    let source: Arc<dyn ReferenceSource> = if offline {
        Arc::new(OfflineSource)
    } else {
        Arc::new(TravelApiClient::new(config).context("Failed to build HTTP client")?)
    };
    let store = Arc::new(FileCache::new(config.cache_root()));
    let translator = Arc::new(CityTranslator::new());
    Ok(Arc::new(ReferenceData::new(source, store, translator)))
}

fn print_flight(index: usize, flight: &Flight, formatter: &Formatter) {
    println!(
        "{:>4}. {:<8} {:<40} {:>12}  {} {:>7}  {:<9} {}",
        index + 1,
        flight.flight_number(),
        formatter.format_route(&flight.origin, &flight.destination),
        formatter.format_price(flight.price),
        format_display_date(flight.depart_date),
        flight.duration.map(format_duration).unwrap_or_default(),
        format_changes(flight.number_of_changes),
        flight.status()
    );
}

fn print_listing<S: FlightSource>(listing: &mut FlightListing<S>, pages: usize, formatter: &Formatter) {
    for _ in 1..pages {
        if !listing.has_more() {
            break;
        }
        listing.load_next_page();
    }

    if let Some(message) = listing.error() {
        println!("{}", message);
        return;
    }
    for (i, flight) in listing.flights().iter().enumerate() {
        print_flight(i, flight, formatter);
    }
    println!(
        "Showing {} of {} offers{}",
        listing.flights().len(),
        listing.total(),
        if listing.has_more() { " (more available)" } else { "" }
    );
}

fn print_detail(detail: &FlightDetail, formatter: &Formatter) {
    println!("Flight {}  {}", detail.flight_number, formatter.format_flight_info(&detail.flight));
    println!("  Airline:   {}", detail.airline_name);
    println!("  From:      {} ({})", detail.origin_name, detail.flight.origin);
    println!("  To:        {} ({})", detail.destination_name, detail.flight.destination);
    println!("  Date:      {}", detail.departure_date);
    println!("  Departs:   {}", detail.departure_time);
    println!("  Arrives:   {}", detail.arrival_time);
    println!("  Duration:  {}", detail.duration);
    println!("  Stops:     {}", detail.changes);
    if detail.flight.is_expired_at(Utc::now()) {
        println!("  Price:     {} (offer expired)", detail.price);
    } else {
        println!("  Price:     {}", detail.price);
    }
    println!("  Status:    {}", detail.status());
    if let Some(ret) = detail.flight.return_date {
        println!("  Return:    {}", format_display_date(ret));
    }
}

fn generator(reference: Arc<ReferenceData>, seed: Option<u64>) -> FlightGenerator {
    match seed {
        Some(seed) => FlightGenerator::seeded(reference, seed),
        None => FlightGenerator::new(reference),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let reference = open_reference(&config, cli.offline)?;
    let formatter = Formatter::new(
        reference.clone(),
        config.language.clone(),
        config.currency.clone(),
    );

    let needs_fetch = !reference.is_ready() || !reference.has_cities();
    match &cli.command {
        Commands::Sync => reference.load_all(),
        Commands::Recent | Commands::Translate { .. } | Commands::ClearCache => {}
        _ if needs_fetch && !cli.offline => reference.load_all(),
        _ => {}
    }

    match &cli.command {
        Commands::Sync => {
            println!(
                "Synced {} airports, {} airlines, {} cities, {} countries into {}",
                reference.airports().len(),
                reference.airlines().len(),
                reference.cities().len(),
                reference.countries().len(),
                config.cache_root().display()
            );
            if let Some(at) = reference.last_updated() {
                println!("Last update: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        Commands::Airports { query } => {
            let airports = reference.search_airports(query);
            for airport in &airports {
                println!(
                    "{}  {:<40} {}",
                    airport.code,
                    airport.name,
                    airport.city().unwrap_or("-")
                );
            }
            println!("{} airport(s)", airports.len());
        }
        Commands::Cities { query } => {
            let cities = reference.search_cities(query);
            for city in &cities {
                let localized = reference
                    .translator()
                    .to_localized(&city.name)
                    .unwrap_or_else(|| city.name.clone());
                println!("{}  {:<30} {:<30} {}", city.code, city.name, localized, city.country_code);
            }
            println!("{} city(ies)", cities.len());
        }
        Commands::Resolve { name } => match reference.find_city_code(name) {
            Some(code) => println!("{}", code),
            None => anyhow::bail!("No city matches '{}'", name),
        },
        Commands::Flights { pages, seed } => {
            let mut listing = FlightListing::new(generator(reference.clone(), *seed));
            listing.load_flights();
            print_listing(&mut listing, *pages, &formatter);
        }
        Commands::Search {
            origin,
            destination,
            date,
            return_date,
            details,
            seed,
        } => {
            let mut form = FilterForm::new(reference.clone());
            form.set_origin(origin.as_str());
            form.set_destination(destination.as_str());
            if let Some(date) = date {
                form.set_departure_date(*date)?;
            }
            form.set_return_date(*return_date)?;
            let filters = form.create_filters()?;
            reference.record_search(
                FlightSearchParameters::from(&filters).with_currency(config.currency.clone()),
            );

            println!(
                "{} on {}",
                formatter.format_route(&filters.origin, &filters.destination),
                format_display_date(filters.departure_date)
            );
            let mut listing = FlightListing::new(generator(reference.clone(), *seed));
            listing.search_flights(filters);
            print_listing(&mut listing, 1, &formatter);

            if *details {
                if let Some(cheapest) = listing.flights().first() {
                    println!();
                    print_detail(&FlightDetail::resolve(cheapest.clone(), &formatter), &formatter);
                }
            }
        }
        Commands::Recent => {
            let searches = reference.recent_searches();
            if searches.is_empty() {
                println!("No recent searches");
            }
            for params in searches {
                let ret = params
                    .return_date
                    .map(|d| format!(" return {}", d))
                    .unwrap_or_default();
                println!("{} → {}  {}{}", params.origin, params.destination, params.depart_date, ret);
            }
        }
        Commands::Translate { list: true, .. } => {
            let translator = reference.translator();
            for localized in translator.supported_localized() {
                let canonical = translator.to_canonical(&localized).unwrap_or("-");
                println!("{} = {}", localized, canonical);
            }
        }
        Commands::Translate {
            name: Some(name), ..
        } => {
            let translator = reference.translator();
            if let Some(canonical) = translator.to_canonical(name) {
                println!("{}", canonical);
            } else if let Some(localized) = translator.to_localized(name) {
                println!("{}", localized);
            } else {
                let matches = translator.search(name);
                if matches.is_empty() {
                    anyhow::bail!("'{}' is not in the translation table", name);
                }
                for pair in matches {
                    println!("{} = {}", pair.localized, pair.canonical);
                }
            }
        }
        Commands::Translate { name: None, .. } => anyhow::bail!("A city name or --list is required"),
        Commands::ClearCache => {
            reference.clear_cache()?;
            println!("Cleared cache in {}", config.cache_root().display());
        }
    }

    Ok(())
}
