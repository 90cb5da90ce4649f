// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Localized city name lookup.
//!
//! The table maps localized city names (lowercase) to their canonical
//! English form. It is parsed once per [`CityTranslator`]; the reverse
//! direction is built on first use.

pub mod data;

use std::collections::HashMap;
use std::sync::OnceLock;

use data::{get_all_city_names, CityNameEntry};

/// A localized/canonical pair returned by [`CityTranslator::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityNamePair {
    /// Title-cased localized name, e.g. "Санкт-Петербург".
    pub localized: String,
    /// Lowercase canonical name, e.g. "saint petersburg".
    pub canonical: String,
}

pub struct CityTranslator {
    forward: HashMap<String, String>,
    entries: Vec<CityNameEntry>,
    reverse: OnceLock<HashMap<String, String>>,
}

impl Default for CityTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl CityTranslator {
    /// Builds a translator over the bundled table.
    pub fn new() -> Self {
        Self::from_entries(get_all_city_names())
    }

    /// Builds a translator over a custom table. Keys are normalized, and the
    /// first occurrence of a duplicate localized name wins.
    pub fn from_entries(entries: Vec<CityNameEntry>) -> Self {
        let mut forward = HashMap::with_capacity(entries.len());
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            let localized = normalize(&entry.localized);
            let canonical = normalize(&entry.canonical);
            if localized.is_empty() || canonical.is_empty() || forward.contains_key(&localized) {
                continue;
            }
            forward.insert(localized.clone(), canonical.clone());
            kept.push(CityNameEntry {
                localized,
                canonical,
            });
        }
        log::debug!("City translator built — entries={}", kept.len());
        Self {
            forward,
            entries: kept,
            reverse: OnceLock::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical (English, lowercase) name for a localized city name.
    pub fn to_canonical(&self, localized: &str) -> Option<&str> {
        self.forward.get(&normalize(localized)).map(String::as_str)
    }

    /// Title-cased localized name for a canonical city name.
    pub fn to_localized(&self, canonical: &str) -> Option<String> {
        self.reverse()
            .get(&normalize(canonical))
            .map(|name| title_case(name))
    }

    pub fn is_supported(&self, name: &str) -> bool {
        let key = normalize(name);
        self.forward.contains_key(&key) || self.reverse().contains_key(&key)
    }

    pub fn supported_localized(&self) -> Vec<String> {
        let mut names: Vec<String> = self.forward.keys().map(|n| title_case(n)).collect();
        names.sort();
        names
    }

    pub fn supported_canonical(&self) -> Vec<String> {
        let mut names: Vec<String> = self.reverse().keys().cloned().collect();
        names.sort();
        names
    }

    /// All pairs where either side contains `query` (case-insensitive),
    /// sorted by localized name.
    pub fn search(&self, query: &str) -> Vec<CityNamePair> {
        let q = query.trim().to_lowercase();
        let mut results: Vec<CityNamePair> = self
            .entries
            .iter()
            .filter(|e| e.localized.contains(&q) || e.canonical.contains(&q))
            .map(|e| CityNamePair {
                localized: title_case(&e.localized),
                canonical: e.canonical.clone(),
            })
            .collect();
        results.sort_by(|a, b| a.localized.cmp(&b.localized));
        results
    }

    // Several localized spellings may share one canonical name
    // ("спб", "петербург", "санкт-петербург"); the longest one is kept.
    fn reverse(&self) -> &HashMap<String, String> {
        self.reverse.get_or_init(|| {
            let mut map: HashMap<String, String> = HashMap::new();
            for entry in &self.entries {
                match map.get(&entry.canonical) {
                    Some(existing) if !prefer(&entry.localized, existing) => {}
                    _ => {
                        map.insert(entry.canonical.clone(), entry.localized.clone());
                    }
                }
            }
            log::debug!("City translator reverse index built — entries={}", map.len());
            map
        })
    }
}

fn prefer(candidate: &str, existing: &str) -> bool {
    let (c, e) = (candidate.chars().count(), existing.chars().count());
    c > e || (c == e && candidate < existing)
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Uppercases the first letter of every word; words break on whitespace and
/// hyphens.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = ch.is_whitespace() || ch == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_canonical_normalizes_input() {
        let t = CityTranslator::new();
        assert_eq!(t.to_canonical("  Москва "), Some("moscow"));
        assert_eq!(t.to_canonical("МОСКВА"), Some("moscow"));
        assert_eq!(t.to_canonical("Атлантида"), None);
    }

    #[test]
    fn test_to_localized_prefers_longest_spelling() {
        let t = CityTranslator::new();
        assert_eq!(
            t.to_localized("Saint Petersburg").as_deref(),
            Some("Санкт-Петербург")
        );
        assert_eq!(t.to_localized("rostov-on-don").as_deref(), Some("Ростов-На-Дону"));
        assert_eq!(t.to_localized("gotham"), None);
    }

    #[test]
    fn test_search_matches_both_sides_sorted() {
        let t = CityTranslator::from_entries(vec![
            CityNameEntry {
                localized: "париж".into(),
                canonical: "paris".into(),
            },
            CityNameEntry {
                localized: "берлин".into(),
                canonical: "berlin".into(),
            },
            CityNameEntry {
                localized: "бергамо".into(),
                canonical: "bergamo".into(),
            },
        ]);

        let by_canonical = t.search("BER");
        assert_eq!(by_canonical.len(), 2);
        assert_eq!(by_canonical[0].localized, "Бергамо");
        assert_eq!(by_canonical[1].localized, "Берлин");

        let by_localized = t.search("пар");
        assert_eq!(by_localized.len(), 1);
        assert_eq!(by_localized[0].canonical, "paris");
    }

    #[test]
    fn test_duplicate_localized_first_wins() {
        let t = CityTranslator::from_entries(vec![
            CityNameEntry {
                localized: "Рим".into(),
                canonical: "rome".into(),
            },
            CityNameEntry {
                localized: "рим".into(),
                canonical: "roma".into(),
            },
        ]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.to_canonical("рим"), Some("rome"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("нью-йорк"), "Нью-Йорк");
        assert_eq!(title_case("нижний новгород"), "Нижний Новгород");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_is_supported() {
        let t = CityTranslator::new();
        assert!(t.is_supported("Казань"));
        assert!(t.is_supported("kazan"));
        assert!(!t.is_supported("Xyzzy"));
        assert!(t.supported_canonical().contains(&"kazan".to_string()));
    }
}
