// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Paginated view over a generated flight list.
//!
//! The full candidate list is produced once per load cycle by a
//! [`FlightSource`]; pages of [`PAGE_SIZE`] are then revealed one at a time.
//! Every state change is pushed to subscribers as a [`ListingSnapshot`].

use log::{debug, error, info};
use std::sync::mpsc::Receiver;

use crate::events::Subscribers;
use crate::models::{Flight, FlightFilters};
use crate::SkyfareError;

pub const PAGE_SIZE: usize = 50;
pub const NO_RESULTS_MESSAGE: &str = "No flights found for your search.";

/// Produces the full candidate list for one load cycle.
pub trait FlightSource {
    fn generate_all(&mut self) -> Result<Vec<Flight>, SkyfareError>;
    fn generate_filtered(&mut self, filters: &FlightFilters) -> Result<Vec<Flight>, SkyfareError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingState {
    Empty,
    Loading,
    /// `page` is the index of the last page revealed.
    Populated { page: usize },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingSnapshot {
    pub flights: Vec<Flight>,
    pub total: usize,
    pub has_more: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub filters: Option<FlightFilters>,
    pub state: ListingState,
    /// Load cycle this snapshot belongs to.
    pub cycle: u64,
    /// Position within the cycle; never decreases.
    pub sequence: u64,
}

/// Identifies an in-flight load. Only the latest ticket can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    cycle: u64,
}

pub struct FlightListing<S> {
    source: S,
    page_size: usize,
    all_flights: Vec<Flight>,
    displayed: Vec<Flight>,
    next_page: usize,
    has_more: bool,
    state: ListingState,
    error: Option<String>,
    filters: Option<FlightFilters>,
    pending: Option<LoadTicket>,
    cycle: u64,
    sequence: u64,
    subscribers: Subscribers<ListingSnapshot>,
}

impl<S: FlightSource> FlightListing<S> {
    pub fn new(source: S) -> Self {
        Self::with_page_size(source, PAGE_SIZE)
    }

    pub fn with_page_size(source: S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            all_flights: Vec::new(),
            displayed: Vec::new(),
            next_page: 0,
            has_more: false,
            state: ListingState::Empty,
            error: None,
            filters: None,
            pending: None,
            cycle: 0,
            sequence: 0,
            subscribers: Subscribers::new(),
        }
    }

    pub fn subscribe(&self) -> Receiver<ListingSnapshot> {
        self.subscribers.subscribe()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Unfiltered listing of popular routes.
    pub fn load_flights(&mut self) {
        let ticket = self.begin_load(None);
        let result = self.source.generate_all();
        self.complete_load(ticket, result);
    }

    /// Replaces the listing with offers for one route.
    pub fn search_flights(&mut self, filters: FlightFilters) {
        let ticket = self.begin_load(Some(filters.clone()));
        let result = self.source.generate_filtered(&filters);
        self.complete_load(ticket, result);
    }

    /// Re-runs the last search, or the unfiltered listing if there is none.
    pub fn refresh(&mut self) {
        match self.filters.clone() {
            Some(filters) => self.search_flights(filters),
            None => self.load_flights(),
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters = None;
        self.load_flights();
    }

    /// Resets the listing and enters `Loading`. Any earlier ticket becomes
    /// stale.
    pub fn begin_load(&mut self, filters: Option<FlightFilters>) -> LoadTicket {
        self.cycle += 1;
        self.sequence = 0;
        self.all_flights.clear();
        self.displayed.clear();
        self.next_page = 0;
        self.has_more = true;
        self.error = None;
        self.filters = filters;
        self.state = ListingState::Loading;

        let ticket = LoadTicket { cycle: self.cycle };
        self.pending = Some(ticket);
        info!(
            target: "flight",
            "Loading flights — cycle={} filtered={}",
            self.cycle,
            self.filters.is_some()
        );
        self.publish();
        ticket
    }

    /// Applies a generation result. Returns false for a stale ticket, which
    /// leaves the listing untouched.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Flight>, SkyfareError>,
    ) -> bool {
        if self.pending != Some(ticket) {
            debug!(
                target: "flight",
                "Ignoring stale load result — ticket_cycle={} current_cycle={}",
                ticket.cycle,
                self.cycle
            );
            return false;
        }
        self.pending = None;

        match result {
            Ok(flights) => {
                info!(
                    target: "flight",
                    "Flights loaded — cycle={} count={}",
                    self.cycle,
                    flights.len()
                );
                if flights.is_empty() && self.filters.is_some() {
                    self.error = Some(NO_RESULTS_MESSAGE.to_string());
                }
                self.all_flights = flights;
                self.state = ListingState::Empty;
                self.load_next_page();
            }
            Err(e) => {
                error!(target: "flight", "Failed to load flights — cycle={} error={}", self.cycle, e);
                self.has_more = false;
                self.error = Some(e.to_string());
                self.state = ListingState::Failed(e.to_string());
                self.publish();
            }
        }
        true
    }

    /// Reveals the next page. Ignored while a load is in flight.
    pub fn load_next_page(&mut self) {
        if self.pending.is_some() {
            debug!(target: "flight", "Load in progress, next page request ignored");
            return;
        }

        let start = self.next_page * self.page_size;
        if start >= self.all_flights.len() {
            if self.has_more {
                self.has_more = false;
                self.publish();
            }
            return;
        }

        let end = (start + self.page_size).min(self.all_flights.len());
        let page = &self.all_flights[start..end];
        if self.next_page == 0 {
            self.displayed = page.to_vec();
        } else {
            self.displayed.extend_from_slice(page);
        }

        self.state = ListingState::Populated {
            page: self.next_page,
        };
        self.next_page += 1;
        self.has_more = self.displayed.len() < self.all_flights.len();
        debug!(
            target: "flight",
            "Page loaded — page={} displayed={} total={}",
            self.next_page - 1,
            self.displayed.len(),
            self.all_flights.len()
        );
        self.publish();
    }

    pub fn flights(&self) -> &[Flight] {
        &self.displayed
    }

    pub fn total(&self) -> usize {
        self.all_flights.len()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filters(&self) -> Option<&FlightFilters> {
        self.filters.as_ref()
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        ListingSnapshot {
            flights: self.displayed.clone(),
            total: self.all_flights.len(),
            has_more: self.has_more,
            is_loading: self.is_loading(),
            error: self.error.clone(),
            filters: self.filters.clone(),
            state: self.state.clone(),
            cycle: self.cycle,
            sequence: self.sequence,
        }
    }

    fn publish(&mut self) {
        self.sequence += 1;
        if !self.subscribers.is_empty() {
            self.subscribers.publish(&self.snapshot());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    struct FixedSource {
        flights: Vec<Flight>,
        calls: usize,
        fail: bool,
    }

    impl FixedSource {
        fn with(count: u32) -> Self {
            Self {
                flights: (0..count).map(flight).collect(),
                calls: 0,
                fail: false,
            }
        }
    }

    impl FlightSource for FixedSource {
        fn generate_all(&mut self) -> Result<Vec<Flight>, SkyfareError> {
            self.calls += 1;
            if self.fail {
                return Err(SkyfareError::Generation("source offline".into()));
            }
            Ok(self.flights.clone())
        }

        fn generate_filtered(&mut self, filters: &FlightFilters) -> Result<Vec<Flight>, SkyfareError> {
            self.calls += 1;
            Ok(self
                .flights
                .iter()
                .filter(|f| f.origin == filters.origin)
                .cloned()
                .collect())
        }
    }

    fn flight(i: u32) -> Flight {
        let now = Utc::now();
        Flight {
            price: 1000 + i,
            trip_class: 0,
            show_to_affiliates: true,
            origin: "MOW".into(),
            destination: "LED".into(),
            gate_id: Some(format!("gate_0_1_{}", i)),
            depart_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            return_date: None,
            number_of_changes: 0,
            found_at: now,
            duration: Some(90),
            distance: 600,
            actual: true,
            expires_at: now + Duration::hours(1),
            airline: Some("SU".into()),
        }
    }

    #[test]
    fn test_pagination_sequence() {
        let mut listing = FlightListing::new(FixedSource::with(120));
        listing.load_flights();

        let mut displayed = vec![listing.flights().len()];
        let mut more = vec![listing.has_more()];
        listing.load_next_page();
        displayed.push(listing.flights().len());
        more.push(listing.has_more());
        listing.load_next_page();
        displayed.push(listing.flights().len());
        more.push(listing.has_more());

        assert_eq!(displayed, vec![50, 100, 120]);
        assert_eq!(more, vec![true, true, false]);
        assert_eq!(listing.state(), &ListingState::Populated { page: 2 });
    }

    #[test]
    fn test_next_page_after_end_is_noop() {
        let mut listing = FlightListing::new(FixedSource::with(30));
        listing.load_flights();
        assert!(!listing.has_more());

        let before = listing.flights().to_vec();
        listing.load_next_page();
        listing.load_next_page();
        assert_eq!(listing.flights(), before.as_slice());
        assert!(!listing.has_more());
    }

    #[test]
    fn test_next_page_ignored_while_loading() {
        let mut listing = FlightListing::new(FixedSource::with(120));
        let ticket = listing.begin_load(None);
        listing.load_next_page();
        assert!(listing.flights().is_empty());
        assert!(listing.is_loading());

        let flights = (0..120).map(flight).collect();
        assert!(listing.complete_load(ticket, Ok(flights)));
        assert_eq!(listing.flights().len(), 50);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut listing = FlightListing::new(FixedSource::with(0));
        let old = listing.begin_load(None);
        let current = listing.begin_load(None);

        assert!(!listing.complete_load(old, Ok(vec![flight(1)])));
        assert!(listing.is_loading());
        assert!(listing.complete_load(current, Ok(vec![flight(2), flight(3)])));
        assert_eq!(listing.total(), 2);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut source = FixedSource::with(10);
        source.fail = true;
        let mut listing = FlightListing::new(source);
        listing.load_flights();

        assert_eq!(listing.error(), Some("Flight generation failed: source offline"));
        assert!(matches!(listing.state(), ListingState::Failed(_)));
        assert!(!listing.has_more());
        assert_eq!(listing.source().calls, 1);

        listing.load_next_page();
        assert_eq!(listing.source().calls, 1);
        assert!(listing.flights().is_empty());
    }

    #[test]
    fn test_empty_search_sets_message() {
        let mut listing = FlightListing::new(FixedSource::with(5));
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        listing.search_flights(FlightFilters::new("AER", "LED", date, None));
        assert_eq!(listing.error(), Some(NO_RESULTS_MESSAGE));
        assert_eq!(listing.state(), &ListingState::Empty);

        // Refresh repeats the filtered search.
        listing.refresh();
        assert_eq!(listing.filters().map(|f| f.origin.as_str()), Some("AER"));

        listing.clear_filters();
        assert!(listing.filters().is_none());
        assert_eq!(listing.flights().len(), 5);
        assert!(listing.error().is_none());
    }

    #[test]
    fn test_snapshots_are_ordered_within_cycle() {
        let mut listing = FlightListing::with_page_size(FixedSource::with(25), 10);
        let rx = listing.subscribe();
        listing.load_flights();
        listing.load_next_page();
        listing.load_next_page();
        listing.load_flights();

        let snapshots: Vec<ListingSnapshot> = rx.try_iter().collect();
        assert!(snapshots.first().unwrap().is_loading);
        for pair in snapshots.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(b.cycle > a.cycle || (b.cycle == a.cycle && b.sequence > a.sequence));
        }
        let last = snapshots.last().unwrap();
        assert_eq!(last.cycle, 2);
        assert_eq!(last.flights.len(), 10);
        assert_eq!(last.total, 25);
    }
}
