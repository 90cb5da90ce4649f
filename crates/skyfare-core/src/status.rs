// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Seconds around departure/arrival that count as "just happened".
const WINDOW_SECS: i64 = 1800;
const DEFAULT_BLOCK_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Scheduled,
    Delayed,
    Boarding,
    Departed,
    Arrived,
    Cancelled,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Scheduled,
        FlightStatus::Delayed,
        FlightStatus::Boarding,
        FlightStatus::Departed,
        FlightStatus::Arrived,
        FlightStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "scheduled",
            FlightStatus::Delayed => "delayed",
            FlightStatus::Boarding => "boarding",
            FlightStatus::Departed => "departed",
            FlightStatus::Arrived => "arrived",
            FlightStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn stable_hash(s: &str) -> u64 {
    let mut h = DefaultHasher::new();
    s.hash(&mut h);
    h.finish()
}

pub fn arrival_time(departure: DateTime<Utc>, duration_minutes: Option<u32>) -> DateTime<Utc> {
    match duration_minutes {
        Some(minutes) => departure + Duration::minutes(i64::from(minutes)),
        None => departure + Duration::hours(DEFAULT_BLOCK_HOURS),
    }
}

/// Airline prefix (first two characters, or "FL") followed by a number in
/// 1000..=9999 derived from the route.
pub fn flight_number(airline: Option<&str>, origin: &str, destination: &str) -> String {
    let prefix: String = match airline {
        Some(code) if !code.is_empty() => code.chars().take(2).collect::<String>().to_uppercase(),
        _ => "FL".to_string(),
    };
    let route = format!("{}{}", origin, destination);
    let number = stable_hash(&route) % 9000 + 1000;
    format!("{}{}", prefix, number)
}

/// Time-window rules first, then a hash of the flight number picks the rare
/// cancelled/delayed outcomes.
pub fn derive_status(
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
    now: DateTime<Utc>,
    flight_number: &str,
) -> FlightStatus {
    let until_departure = (departure - now).num_seconds();
    let until_arrival = (arrival - now).num_seconds();

    if until_arrival < -WINDOW_SECS {
        return FlightStatus::Arrived;
    }
    if until_departure < -WINDOW_SECS && until_arrival > 0 {
        return FlightStatus::Departed;
    }
    if until_departure > 0 && until_departure < WINDOW_SECS {
        return FlightStatus::Boarding;
    }

    let h = stable_hash(flight_number);
    if h % 50 == 0 {
        FlightStatus::Cancelled
    } else if h % 10 == 0 {
        FlightStatus::Delayed
    } else {
        FlightStatus::Scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_number_with(pred: impl Fn(u64) -> bool) -> String {
        (0..100_000)
            .map(|i| format!("SU{}", i))
            .find(|n| pred(stable_hash(n)))
            .expect("no matching flight number in search space")
    }

    #[test]
    fn test_boarding_ten_minutes_out() {
        let now = Utc::now();
        let dep = now + Duration::seconds(600);
        let arr = arrival_time(dep, None);
        // Even a number that would hash to "cancelled" is boarding.
        let cancelled = find_number_with(|h| h % 50 == 0);
        assert_eq!(derive_status(dep, arr, now, &cancelled), FlightStatus::Boarding);
    }

    #[test]
    fn test_arrived_an_hour_ago() {
        let now = Utc::now();
        let arr = now - Duration::seconds(3600);
        let dep = arr - Duration::hours(3);
        let delayed = find_number_with(|h| h % 10 == 0 && h % 50 != 0);
        assert_eq!(derive_status(dep, arr, now, &delayed), FlightStatus::Arrived);
    }

    #[test]
    fn test_departed_while_airborne() {
        let now = Utc::now();
        let dep = now - Duration::hours(1);
        let arr = now + Duration::hours(1);
        assert_eq!(derive_status(dep, arr, now, "SU1234"), FlightStatus::Departed);
    }

    #[test]
    fn test_hash_rules_in_future() {
        let now = Utc::now();
        let dep = now + Duration::days(2);
        let arr = dep + Duration::hours(2);

        let cancelled = find_number_with(|h| h % 50 == 0);
        let delayed = find_number_with(|h| h % 10 == 0 && h % 50 != 0);
        let scheduled = find_number_with(|h| h % 10 != 0);

        assert_eq!(derive_status(dep, arr, now, &cancelled), FlightStatus::Cancelled);
        assert_eq!(derive_status(dep, arr, now, &delayed), FlightStatus::Delayed);
        assert_eq!(derive_status(dep, arr, now, &scheduled), FlightStatus::Scheduled);
    }

    #[test]
    fn test_flight_number_shape() {
        let n = flight_number(Some("su"), "MOW", "LED");
        assert!(n.starts_with("SU"));
        let digits: u32 = n[2..].parse().unwrap();
        assert!((1000..=9999).contains(&digits));
        assert_eq!(n, flight_number(Some("SU7"), "MOW", "LED"));
        assert!(flight_number(None, "MOW", "LED").starts_with("FL"));
        assert!(flight_number(Some(""), "MOW", "LED").starts_with("FL"));
    }

    #[test]
    fn test_default_arrival() {
        let dep = Utc::now();
        assert_eq!(arrival_time(dep, None) - dep, Duration::hours(2));
        assert_eq!(arrival_time(dep, Some(95)) - dep, Duration::minutes(95));
    }
}
