use anyhow::{Context, Result};
use serde::Deserialize;

/// City list bundled into the binary. The asset is an external data file;
/// only its field names (`city`, `lat`, `lng`) are part of the contract.
const BUNDLED_CITIES: &str = include_str!("../assets/cities.json");

/// A single known location. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct CityRecord {
    city: String,
    lat: f64,
    lng: f64,
}

impl From<CityRecord> for City {
    fn from(record: CityRecord) -> Self {
        City {
            name: record.city,
            latitude: record.lat,
            longitude: record.lng,
        }
    }
}

/// Static name → coordinates lookup, loaded once at startup.
#[derive(Debug, Clone)]
pub struct CityDirectory {
    cities: Vec<City>,
}

impl CityDirectory {
    pub fn new(cities: Vec<City>) -> Self {
        Self { cities }
    }

    /// Parse the bundled city asset.
    pub fn bundled() -> Result<Self> {
        let records: Vec<CityRecord> = serde_json::from_str(BUNDLED_CITIES)
            .context("Failed to parse bundled city list")?;

        Ok(Self::new(records.into_iter().map(City::from).collect()))
    }

    /// Case-insensitive exact match on the city name. Not-found is a normal
    /// outcome, not an error.
    pub fn resolve(&self, name: &str) -> Option<&City> {
        let wanted = name.to_lowercase();
        self.cities.iter().find(|c| c.name.to_lowercase() == wanted)
    }

    /// All known city names, in asset order. Feeds the selector UI.
    pub fn names(&self) -> Vec<&str> {
        self.cities.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> CityDirectory {
        CityDirectory::new(vec![
            City {
                name: "London".to_string(),
                latitude: 51.5,
                longitude: -0.12,
            },
            City {
                name: "Paris".to_string(),
                latitude: 48.85,
                longitude: 2.35,
            },
        ])
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let dir = directory();

        let city = dir.resolve("lOnDoN").expect("London must resolve");
        assert_eq!(city.name, "London");
        assert_eq!(city.latitude, 51.5);
        assert_eq!(city.longitude, -0.12);
    }

    #[test]
    fn resolve_unknown_city_is_none() {
        let dir = directory();
        assert!(dir.resolve("Atlantis").is_none());
    }

    #[test]
    fn names_lists_every_city() {
        let dir = directory();
        assert_eq!(dir.names(), vec!["London", "Paris"]);
    }

    #[test]
    fn bundled_asset_parses_and_resolves() {
        let dir = CityDirectory::bundled().expect("bundled asset must parse");
        assert!(dir.resolve("london").is_some());
        assert!(dir.names().len() > 1);
    }
}
