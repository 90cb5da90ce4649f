// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use serde_json;

/// One row of the bundled translation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityNameEntry {
    pub localized: String,
    pub canonical: String,
}

pub fn get_all_city_names() -> Vec<CityNameEntry> {
    serde_json::from_str(include_str!("city_names.json")).expect("Failed to parse city_names.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_name_loading() {
        let entries = get_all_city_names();
        assert!(entries.len() > 250, "Translation table should be populated");

        let moscow = entries
            .iter()
            .find(|e| e.localized == "москва")
            .expect("Moscow missing");
        assert_eq!(moscow.canonical, "moscow");

        // Keys are stored pre-normalized
        for entry in &entries {
            assert_eq!(entry.localized, entry.localized.trim().to_lowercase());
            assert_eq!(entry.canonical, entry.canonical.trim().to_lowercase());
        }
    }
}
