//! Rally table input.
//!
//! The rally list is a delimited table with at least `City`, `State`, and
//! `Date` (`YYYY-MM-DD`) columns and an optional `Population` column. Extra
//! columns are ignored. A `?` or empty population cell means unknown.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use rally_impact_mortality::dates::parse_iso_date;
use rally_impact_rally_models::RallyRecord;

use crate::RallyError;

/// Placeholder used in the source table for an unknown crowd size.
const UNKNOWN_POPULATION: &str = "?";

struct RallyColumns {
    city: usize,
    state: usize,
    date: usize,
    population: Option<usize>,
}

impl RallyColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, RallyError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| RallyError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Self {
            city: require("City")?,
            state: require("State")?,
            date: require("Date")?,
            population: find("Population"),
        })
    }
}

/// Reads rallies from a delimited table, in file order.
///
/// # Errors
///
/// Returns [`RallyError::MissingColumn`] if a required header is absent,
/// [`RallyError::MissingValue`] for an empty city, state, or date cell,
/// [`RallyError::Mortality`] for a malformed date, and
/// [`RallyError::MalformedPopulation`] for a population that is not a
/// whole number.
pub fn read_rallies<R: Read>(reader: R) -> Result<Vec<RallyRecord>, RallyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = RallyColumns::from_headers(&headers)?;

    let mut rallies = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);

        let cell = |index: usize, column: &str| {
            record
                .get(index)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| RallyError::MissingValue {
                    line,
                    column: column.to_string(),
                })
        };

        let city = cell(columns.city, "City")?;
        let state = cell(columns.state, "State")?;
        let date = parse_iso_date(cell(columns.date, "Date")?)?;
        let population = columns
            .population
            .and_then(|index| record.get(index))
            .map(|value| parse_population(value, line))
            .transpose()?
            .flatten();

        rallies.push(RallyRecord {
            city: city.to_string(),
            state: state.to_string(),
            date,
            population,
        });
    }

    log::info!("Read {} rallies", rallies.len());

    Ok(rallies)
}

/// Reads rallies from a file.
///
/// # Errors
///
/// Returns [`RallyError`] if the file cannot be opened or parsed.
pub fn read_rallies_path(path: &Path) -> Result<Vec<RallyRecord>, RallyError> {
    let file = std::fs::File::open(path)?;
    read_rallies(file)
}

fn parse_population(value: &str, line: u64) -> Result<Option<u64>, RallyError> {
    if value.is_empty() || value == UNKNOWN_POPULATION {
        return Ok(None);
    }
    value
        .replace(',', "")
        .parse()
        .map(Some)
        .map_err(|_| RallyError::MalformedPopulation {
            line,
            value: value.to_string(),
        })
}

/// Drops rows identical in every field to an earlier row.
///
/// Rallies that share a city but differ in date or population are distinct
/// events and are kept. Order of the survivors is unchanged.
#[must_use]
pub fn dedup_exact(rallies: Vec<RallyRecord>) -> Vec<RallyRecord> {
    let before = rallies.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<RallyRecord> = rallies
        .into_iter()
        .filter(|rally| seen.insert(rally.clone()))
        .collect();

    let dropped = before - kept.len();
    if dropped > 0 {
        log::info!("Dropped {dropped} duplicate rally rows");
    }

    kept
}
