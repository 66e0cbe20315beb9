//! Wide-format mortality table loader.
//!
//! The JHU CSSE US time series has one row per county: a handful of
//! identifying columns (`UID`, `FIPS`, `Admin2`, `Province_State`, ...)
//! followed by one cumulative-count column per day with an `M/D/YY` header.
//! Rows are turned directly into dense per-county series; there is no
//! intermediate transposed table.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use rally_impact_geography_models::CountyKey;
use rally_impact_mortality_models::{CountyCentroid, DateDomain, MortalitySeries};

use crate::dates::parse_header_date;
use crate::{MortalityError, MortalityTable};

/// Column names describing the identifying part of the table.
///
/// Every header not listed in [`TableLayout::id_columns`] must be a date.
#[derive(Debug, Clone)]
pub struct TableLayout {
    /// Non-date columns. These are dropped after the key and centroid are
    /// extracted.
    pub id_columns: Vec<String>,
    /// County name column (`Admin2`).
    pub county_column: String,
    /// State name column (`Province_State`).
    pub state_column: String,
    /// Country column (`Country_Region`).
    pub country_column: String,
    /// Pre-combined key column (`Combined_Key`).
    pub combined_key_column: String,
    /// Latitude column (`Lat`).
    pub latitude_column: String,
    /// Longitude column (`Long_`).
    pub longitude_column: String,
}

impl Default for TableLayout {
    /// The layout of `time_series_covid19_deaths_US.csv`.
    fn default() -> Self {
        let id_columns = [
            "UID",
            "iso2",
            "iso3",
            "code3",
            "FIPS",
            "Admin2",
            "Province_State",
            "Country_Region",
            "Lat",
            "Long_",
            "Combined_Key",
            "Population",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        Self {
            id_columns,
            county_column: "Admin2".to_string(),
            state_column: "Province_State".to_string(),
            country_column: "Country_Region".to_string(),
            combined_key_column: "Combined_Key".to_string(),
            latitude_column: "Lat".to_string(),
            longitude_column: "Long_".to_string(),
        }
    }
}

impl TableLayout {
    fn is_id_column(&self, header: &str) -> bool {
        self.id_columns.iter().any(|c| c == header)
    }
}

/// Where each piece of a row lives, resolved from the header.
struct ColumnMap {
    parts: Option<(usize, usize, usize)>,
    combined: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    /// `(column index, header)` for each date column, in date order.
    dates: Vec<(usize, String)>,
    width: usize,
}

impl ColumnMap {
    fn key(&self, record: &csv::StringRecord) -> CountyKey {
        let field = |i: usize| record.get(i).unwrap_or("");
        let combined = self.combined.map(|i| CountyKey::from_raw(field(i)));

        let Some((county, state, country)) = self.parts else {
            return combined.unwrap_or_else(|| CountyKey::from_raw(""));
        };

        let computed = CountyKey::from_parts(field(county), field(state), field(country));
        if let Some(combined) = combined
            && combined != computed
        {
            log::warn!("Combined key '{combined}' differs from computed key '{computed}'");
        }
        computed
    }

    // Unassigned and out-of-state rows are written with a literal 0.0.
    #[allow(clippy::float_cmp)]
    fn centroid(&self, record: &csv::StringRecord) -> Option<CountyCentroid> {
        let latitude = record.get(self.latitude?)?.parse::<f64>().ok()?;
        let longitude = record.get(self.longitude?)?.parse::<f64>().ok()?;
        if latitude == 0.0 || longitude == 0.0 {
            return None;
        }
        Some(CountyCentroid {
            latitude,
            longitude,
        })
    }
}

/// Resolves the header row into a [`ColumnMap`] and the shared date domain.
fn map_columns(
    headers: &csv::StringRecord,
    layout: &TableLayout,
) -> Result<(ColumnMap, DateDomain), MortalityError> {
    let position = |name: &str| headers.iter().position(|h| h == name);

    let parts = match (
        position(&layout.county_column),
        position(&layout.state_column),
        position(&layout.country_column),
    ) {
        (Some(county), Some(state), Some(country)) => Some((county, state, country)),
        _ => None,
    };
    let combined = position(&layout.combined_key_column);

    if parts.is_none() && combined.is_none() {
        return Err(MortalityError::MissingKeyColumns {
            message: format!(
                "need '{}', '{}', '{}' or '{}'",
                layout.county_column,
                layout.state_column,
                layout.country_column,
                layout.combined_key_column
            ),
        });
    }

    let mut dates = Vec::new();
    let mut previous: Option<NaiveDate> = None;
    let mut start: Option<NaiveDate> = None;

    for (i, header) in headers.iter().enumerate() {
        if layout.is_id_column(header) {
            continue;
        }

        let date = parse_header_date(header)?;
        if let Some(previous) = previous {
            if date <= previous {
                return Err(MortalityError::UnsortedDates {
                    previous,
                    next: date,
                });
            }
            if previous.succ_opt() != Some(date) {
                return Err(MortalityError::DateGap {
                    previous,
                    next: date,
                });
            }
        }
        start.get_or_insert(date);
        previous = Some(date);
        dates.push((i, header.to_string()));
    }

    let Some(start) = start else {
        return Err(MortalityError::NoDateColumns);
    };

    let domain = DateDomain::new(start, dates.len());
    let map = ColumnMap {
        parts,
        combined,
        latitude: position(&layout.latitude_column),
        longitude: position(&layout.longitude_column),
        dates,
        width: headers.len(),
    };

    Ok((map, domain))
}

/// Parses a wide mortality table into per-county cumulative series.
///
/// Lines beginning with `#` are ignored and every cell is trimmed.
///
/// # Errors
///
/// * [`MortalityError::MalformedDate`] for a non-identifying header that is
///   not `M/D/YY`.
/// * [`MortalityError::UnsortedDates`] / [`MortalityError::DateGap`] if the
///   date columns are not consecutive ascending days.
/// * [`MortalityError::DuplicateKey`] if two rows produce the same key.
/// * [`MortalityError::MalformedRow`] / [`MortalityError::MalformedCount`]
///   for ragged rows or non-integer counts.
pub fn load<R: Read>(reader: R, layout: &TableLayout) -> Result<MortalityTable, MortalityError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let (columns, domain) = map_columns(&headers, layout)?;

    log::debug!(
        "Mortality table: {} columns, {} date columns ({} .. {:?})",
        columns.width,
        domain.len(),
        domain.start(),
        domain.end()
    );

    let mut table = MortalityTable::new(domain);

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);

        if record.len() != columns.width {
            return Err(MortalityError::MalformedRow {
                line,
                expected: columns.width,
                found: record.len(),
            });
        }

        let counts = columns
            .dates
            .iter()
            .map(|(i, header)| {
                let cell = record.get(*i).unwrap_or("");
                cell.parse::<i64>()
                    .map_err(|_| MortalityError::MalformedCount {
                        line,
                        column: header.clone(),
                        value: cell.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let key = columns.key(&record);
        let centroid = columns.centroid(&record);
        table.insert(key, MortalitySeries::new(domain.start(), counts), centroid)?;
    }

    log::info!(
        "Loaded mortality series for {} counties over {} days",
        table.len(),
        domain.len()
    );

    Ok(table)
}

/// Loads a mortality table from a file using the default JHU layout.
///
/// # Errors
///
/// Returns [`MortalityError`] if the file cannot be opened or parsed.
pub fn load_path(path: &Path) -> Result<MortalityTable, MortalityError> {
    let file = std::fs::File::open(path)?;
    load(file, &TableLayout::default())
}
