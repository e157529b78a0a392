//! Country name and ISO code resolution.
//!
//! Vaccination records name a country by its full name and ISO alpha-3 code
//! while air quality stations report the alpha-2 code, so joining the two
//! needs a table that knows all three spellings.

use serde::{Deserialize, Serialize};

/// One country under its three spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCodes {
    /// Full name, as vaccination records carry it
    pub name: String,
    /// ISO 3166-1 alpha-3
    pub iso3: String,
    /// ISO 3166-1 alpha-2, as air quality stations report it
    pub iso2: String,
}

impl CountryCodes {
    fn matches(&self, key: &str) -> bool {
        [&self.name, &self.iso3, &self.iso2]
            .iter()
            .any(|spelling| spelling.eq_ignore_ascii_case(key))
    }
}

/// Lookup from any spelling of a country to all of its spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryTable {
    countries: Vec<CountryCodes>,
}

impl CountryTable {
    /// Table with no entries; countries only match themselves.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            countries: Vec::new(),
        }
    }

    /// Add a country.
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        iso3: impl Into<String>,
        iso2: impl Into<String>,
    ) -> Self {
        self.countries.push(CountryCodes {
            name: name.into(),
            iso3: iso3.into(),
            iso2: iso2.into(),
        });
        self
    }

    /// Entry for `key` (name, alpha-3 or alpha-2, case-insensitive)
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&CountryCodes> {
        self.countries.iter().find(|country| country.matches(key))
    }

    /// Every spelling of `key`, or just `key` when the country is unlisted.
    #[must_use]
    pub fn spellings<'a>(&'a self, key: &'a str) -> Vec<&'a str> {
        self.resolve(key).map_or_else(
            || vec![key],
            |country| vec![country.name.as_str(), country.iso3.as_str(), country.iso2.as_str()],
        )
    }
}

impl Default for CountryTable {
    fn default() -> Self {
        [
            ("India", "IND", "IN"),
            ("United States", "USA", "US"),
            ("United Kingdom", "GBR", "GB"),
            ("Brazil", "BRA", "BR"),
            ("Germany", "DEU", "DE"),
            ("France", "FRA", "FR"),
            ("Japan", "JPN", "JP"),
            ("Australia", "AUS", "AU"),
        ]
        .into_iter()
        .fold(Self::empty(), |table, (name, iso3, iso2)| {
            table.with(name, iso3, iso2)
        })
    }
}
