//! Offline geocoder backed by a `City,State,County` table.
//!
//! A previous run's augmented output already has the three columns, so it
//! can be fed straight back in to rerun the aggregation without network
//! access.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{GeocodeError, GeocodedPlace, Geocoder, location_query};

#[derive(Debug, Deserialize)]
struct LookupRow {
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "County")]
    county: Option<String>,
}

/// Geocoder answering from an in-memory table.
///
/// Queries are matched case-insensitively on the `"City, ST"` string built
/// by [`location_query`].
#[derive(Debug, Clone, Default)]
pub struct LookupGeocoder {
    counties: BTreeMap<String, Option<String>>,
}

impl LookupGeocoder {
    /// Reads a table with at least `City`, `State`, and `County` columns.
    /// An empty `County` cell records a location with no county. For
    /// repeated locations the first row wins.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Csv`] on malformed input.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeocodeError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut counties = BTreeMap::new();
        for row in csv_reader.deserialize() {
            let row: LookupRow = row?;
            let county = row.county.filter(|c| !c.is_empty());
            counties
                .entry(normalize_query(&location_query(&row.city, &row.state)))
                .or_insert(county);
        }

        log::info!("Loaded {} locations into county lookup table", counties.len());

        Ok(Self { counties })
    }

    /// Reads a lookup table from a file.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the file cannot be opened or parsed.
    pub fn from_path(path: &Path) -> Result<Self, GeocodeError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Number of locations in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counties.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[async_trait]
impl Geocoder for LookupGeocoder {
    fn id(&self) -> &str {
        "lookup"
    }

    async fn geocode(&self, query: &str) -> Result<GeocodedPlace, GeocodeError> {
        let Some(county) = self.counties.get(&normalize_query(query)) else {
            log::debug!("Lookup table has no entry for '{query}'");
            return Ok(GeocodedPlace::empty());
        };

        Ok(GeocodedPlace {
            county: county.clone(),
            formatted_address: Some(query.to_string()),
            raw: serde_json::json!({ "query": query, "county": county }),
        })
    }
}
