// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use crate::models::{Flight, ReferenceEntity};
use crate::reference::ReferenceData;

pub const UNKNOWN_AIRLINE: &str = "Unknown Airline";

/// Names shown when an airline is missing from the reference data.
const AIRLINE_FALLBACKS: &[(&str, &str)] = &[
    ("SU", "Аэрофлот"),
    ("S7", "S7 Airlines"),
    ("UT", "UTair"),
    ("FV", "Россия"),
    ("DP", "Победа"),
    ("WZ", "Red Wings"),
    ("BA", "British Airways"),
    ("LH", "Lufthansa"),
    ("AF", "Air France"),
    ("KL", "KLM"),
    ("EK", "Emirates"),
    ("QR", "Qatar Airways"),
    ("TK", "Turkish Airlines"),
    ("AA", "American Airlines"),
    ("DL", "Delta Air Lines"),
    ("UA", "United Airlines"),
    ("JL", "Japan Airlines"),
    ("NH", "ANA"),
    ("SQ", "Singapore Airlines"),
    ("TG", "Thai Airways"),
];

/// City names for the popular hubs, used before reference data arrives.
const CITY_FALLBACKS: &[(&str, &str)] = &[
    ("MOW", "Москва"),
    ("LED", "Санкт-Петербург"),
    ("AER", "Сочи"),
    ("KZN", "Казань"),
    ("UFA", "Уфа"),
    ("ROV", "Ростов-на-Дону"),
    ("KRR", "Краснодар"),
    ("VOG", "Волгоград"),
    ("SVX", "Екатеринбург"),
    ("OVB", "Новосибирск"),
    ("JFK", "Нью-Йорк"),
    ("LAX", "Лос-Анджелес"),
    ("ORD", "Чикаго"),
    ("DFW", "Даллас"),
    ("DEN", "Денвер"),
    ("ATL", "Атланта"),
    ("BOS", "Бостон"),
    ("SFO", "Сан-Франциско"),
    ("SEA", "Сиэтл"),
    ("MIA", "Майами"),
    ("YYZ", "Торонто"),
    ("YVR", "Ванкувер"),
    ("LHR", "Лондон"),
    ("CDG", "Париж"),
    ("FRA", "Франкфурт"),
    ("AMS", "Амстердам"),
    ("MAD", "Мадрид"),
    ("FCO", "Рим"),
    ("LGW", "Лондон"),
    ("MUC", "Мюнхен"),
    ("ZUR", "Цюрих"),
    ("VIE", "Вена"),
    ("ARN", "Стокгольм"),
    ("OSL", "Осло"),
    ("CPH", "Копенгаген"),
    ("DXB", "Дубай"),
    ("DOH", "Доха"),
    ("AUH", "Абу-Даби"),
    ("CAI", "Каир"),
    ("JED", "Джидда"),
    ("RUH", "Эр-Рияд"),
    ("KWI", "Кувейт"),
    ("BAH", "Бахрейн"),
    ("MCT", "Маскат"),
    ("AMM", "Амман"),
    ("NRT", "Токио"),
    ("ICN", "Сеул"),
    ("SIN", "Сингапур"),
    ("BKK", "Бангкок"),
    ("HKG", "Гонконг"),
    ("PVG", "Шанхай"),
    ("PEK", "Пекин"),
    ("DEL", "Дели"),
    ("BOM", "Мумбаи"),
    ("CCU", "Калькутта"),
    ("SYD", "Сидней"),
    ("MEL", "Мельбурн"),
    ("GRU", "Сан-Паулу"),
    ("EZE", "Буэнос-Айрес"),
    ("LIM", "Лима"),
    ("BOG", "Богота"),
    ("SCL", "Сантьяго"),
    ("PTY", "Панама"),
];

fn lookup(table: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// `1234567` → `1 234 567`.
fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

pub fn format_price(price: u32, currency: &str) -> String {
    let amount = group_thousands(price);
    match currency {
        "RUB" => format!("{} ₽", amount),
        "USD" => format!("${}", amount),
        "EUR" => format!("€{}", amount),
        other => format!("{} {}", amount, other),
    }
}

/// Minutes as `2h 30m`; zero components are omitted.
pub fn format_duration(minutes: u32) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    match (h, m) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

pub fn format_changes(changes: u8) -> String {
    match changes {
        0 => "Direct".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    }
}

/// `05 Mar`
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

pub fn format_time(instant: DateTime<Utc>) -> String {
    instant.format("%H:%M").to_string()
}

/// Display names for codes, backed by the reference store.
#[derive(Clone)]
pub struct Formatter {
    reference: Arc<ReferenceData>,
    language: String,
    currency: String,
}

impl Formatter {
    pub fn new(
        reference: Arc<ReferenceData>,
        language: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            reference,
            language: language.into(),
            currency: currency.into(),
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn format_price(&self, price: u32) -> String {
        format_price(price, &self.currency)
    }

    pub fn format_airline(&self, code: Option<&str>) -> String {
        let Some(code) = code else {
            return UNKNOWN_AIRLINE.to_string();
        };
        match self.reference.find_airline(code) {
            Some(airline) => airline.localized_name(&self.language).to_string(),
            None => lookup(AIRLINE_FALLBACKS, code).unwrap_or(code).to_string(),
        }
    }

    /// Airport city, then city name, then the built-in hub table, then the
    /// code itself.
    pub fn format_city_name(&self, code: &str) -> String {
        if let Some(airport) = self.reference.find_airport(code) {
            return airport.city().map(str::to_string).unwrap_or(airport.name);
        }
        if let Some(city) = self.reference.cities().into_iter().find(|c| c.code == code) {
            return city.localized_name(&self.language).to_string();
        }
        lookup(CITY_FALLBACKS, code).unwrap_or(code).to_string()
    }

    pub fn format_route(&self, origin: &str, destination: &str) -> String {
        format!(
            "{} → {}",
            self.format_city_name(origin),
            self.format_city_name(destination)
        )
    }

    /// Airport name, then city name, then the code.
    pub fn format_location(&self, code: &str) -> String {
        if let Some(airport) = self.reference.find_airport(code) {
            return airport.name;
        }
        self.reference.find_city_name(code).unwrap_or_else(|| code.to_string())
    }

    /// `Direct • 05 Mar`
    pub fn format_flight_info(&self, flight: &Flight) -> String {
        format!(
            "{} • {}",
            format_changes(flight.number_of_changes),
            format_display_date(flight.depart_date)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticSource;
    use crate::cache::MemoryCache;
    use crate::models::{Airline, Airport};
    use skyfare_lexicon::CityTranslator;
    use std::collections::HashMap;

    fn formatter() -> Formatter {
        let mut translations = HashMap::new();
        translations.insert("ru".to_string(), "Аэрофлот".to_string());
        let source = StaticSource {
            airports: vec![Airport {
                code: "SVO".into(),
                name: "Sheremetyevo".into(),
                city_code: Some("MOW".into()),
                city_name: Some("Moscow".into()),
                country_code: Some("RU".into()),
                country_name: None,
                timezone: None,
                coordinates: None,
                name_translations: None,
            }],
            airlines: vec![Airline {
                code: "SU".into(),
                name: "Aeroflot".into(),
                name_translations: Some(translations),
                is_lowcost: None,
                alliance_code: None,
            }],
            ..StaticSource::default()
        };
        let data = ReferenceData::new(
            Arc::new(source),
            Arc::new(MemoryCache::new()),
            Arc::new(CityTranslator::new()),
        );
        data.load_all();
        Formatter::new(Arc::new(data), "ru", "RUB")
    }

    #[test]
    fn test_price_grouping_and_symbols() {
        assert_eq!(format_price(4500, "RUB"), "4 500 ₽");
        assert_eq!(format_price(1234567, "USD"), "$1 234 567");
        assert_eq!(format_price(999, "EUR"), "€999");
        assert_eq!(format_price(12000, "GBP"), "12 000 GBP");
    }

    #[test]
    fn test_duration_and_changes() {
        assert_eq!(format_duration(150), "2h 30m");
        assert_eq!(format_duration(120), "2h");
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_changes(0), "Direct");
        assert_eq!(format_changes(2), "2 stops");
    }

    #[test]
    fn test_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(format_display_date(date), "05 Mar");
    }

    #[test]
    fn test_lookups_with_fallbacks() {
        let f = formatter();
        assert_eq!(f.format_airline(Some("SU")), "Аэрофлот");
        assert_eq!(f.format_airline(Some("LH")), "Lufthansa");
        assert_eq!(f.format_airline(Some("ZZ")), "ZZ");
        assert_eq!(f.format_airline(None), UNKNOWN_AIRLINE);

        assert_eq!(f.format_city_name("SVO"), "Moscow");
        assert_eq!(f.format_city_name("LED"), "Санкт-Петербург");
        assert_eq!(f.format_route("SVO", "QQQ"), "Moscow → QQQ");
        assert_eq!(f.format_location("SVO"), "Sheremetyevo");
        assert_eq!(f.format_location("QQQ"), "QQQ");
    }

    #[test]
    fn test_price_uses_configured_currency() {
        let rub = formatter();
        assert_eq!(rub.format_price(4500), "4 500 ₽");

        let eur = Formatter::new(rub.reference.clone(), "en", "EUR");
        assert_eq!(eur.currency(), "EUR");
        assert_eq!(eur.format_price(4500), "€4 500");
    }
}
