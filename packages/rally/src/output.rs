//! Delimited outputs: the augmented rally table and the rally locations
//! table used for mapping.
//!
//! Missing values are written as empty cells.

use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use rally_impact_mortality::{CountyKey, MortalityTable};
use rally_impact_mortality_models::ImpactResult;
use rally_impact_rally_models::{AugmentedRally, RallyRecord};
use serde::{Deserialize, Serialize};

use crate::RallyError;

#[derive(Debug, Serialize, Deserialize)]
struct AugmentedRow {
    #[serde(rename = "Id")]
    id: usize,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Population")]
    population: Option<u64>,
    #[serde(rename = "County")]
    county: String,
    #[serde(rename = "Combined_Key")]
    combined_key: String,
    deaths_prior: Option<i64>,
    deaths_after: Option<i64>,
    percent_change: Option<f64>,
}

impl AugmentedRow {
    fn new(id: usize, row: &AugmentedRally) -> Self {
        Self {
            id,
            city: row.rally.city.clone(),
            state: row.rally.state.clone(),
            date: row.rally.date,
            population: row.rally.population,
            county: row.county.clone(),
            combined_key: row.impact.key.to_string(),
            deaths_prior: row.impact.deaths_prior,
            deaths_after: row.impact.deaths_after,
            percent_change: row.impact.percent_change,
        }
    }
}

impl From<AugmentedRow> for AugmentedRally {
    fn from(row: AugmentedRow) -> Self {
        Self {
            rally: RallyRecord {
                city: row.city,
                state: row.state,
                date: row.date,
                population: row.population,
            },
            county: row.county,
            impact: ImpactResult {
                key: CountyKey::from_raw(&row.combined_key),
                deaths_prior: row.deaths_prior,
                deaths_after: row.deaths_after,
                percent_change: row.percent_change,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct LocationRow<'a> {
    #[serde(rename = "Id")]
    id: usize,
    #[serde(rename = "City")]
    city: &'a str,
    #[serde(rename = "Lat")]
    latitude: Option<f64>,
    #[serde(rename = "Long_")]
    longitude: Option<f64>,
    percent_change: Option<f64>,
    trend: Option<String>,
}

/// Writes the augmented table, one row per rally, `Id` numbered from 0.
///
/// # Errors
///
/// Returns [`RallyError::Csv`] or [`RallyError::Io`] if writing fails.
pub fn write_augmented<W: Write>(writer: W, rows: &[AugmentedRally]) -> Result<(), RallyError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (id, row) in rows.iter().enumerate() {
        csv_writer.serialize(AugmentedRow::new(id, row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the augmented table to a file.
///
/// # Errors
///
/// Returns [`RallyError`] if the file cannot be created or written.
pub fn write_augmented_path(path: &Path, rows: &[AugmentedRally]) -> Result<(), RallyError> {
    let file = std::fs::File::create(path)?;
    write_augmented(file, rows)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Reads a table previously written by [`write_augmented`].
///
/// # Errors
///
/// Returns [`RallyError::Csv`] if a row does not have the expected shape.
pub fn read_augmented<R: Read>(reader: R) -> Result<Vec<AugmentedRally>, RallyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<AugmentedRow>()
        .map(|row| row.map(AugmentedRally::from).map_err(RallyError::from))
        .collect()
}

/// Reads an augmented table from a file.
///
/// # Errors
///
/// Returns [`RallyError`] if the file cannot be opened or parsed.
pub fn read_augmented_path(path: &Path) -> Result<Vec<AugmentedRally>, RallyError> {
    let file = std::fs::File::open(path)?;
    read_augmented(file)
}

/// Writes one row per rally with its county's coordinates and trend.
///
/// Coordinates come from the mortality table's county centroid and are
/// empty when the county is unmatched or has none.
///
/// # Errors
///
/// Returns [`RallyError::Csv`] or [`RallyError::Io`] if writing fails.
pub fn write_locations<W: Write>(
    writer: W,
    rows: &[AugmentedRally],
    mortality: &MortalityTable,
) -> Result<(), RallyError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (id, row) in rows.iter().enumerate() {
        let centroid = mortality.centroid(&row.impact.key);
        csv_writer.serialize(LocationRow {
            id,
            city: &row.rally.city,
            latitude: centroid.map(|c| c.latitude),
            longitude: centroid.map(|c| c.longitude),
            percent_change: row.impact.percent_change,
            trend: row.trend().map(|t| t.to_string()),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the locations table to a file.
///
/// # Errors
///
/// Returns [`RallyError`] if the file cannot be created or written.
pub fn write_locations_path(
    path: &Path,
    rows: &[AugmentedRally],
    mortality: &MortalityTable,
) -> Result<(), RallyError> {
    let file = std::fs::File::create(path)?;
    write_locations(file, rows, mortality)?;
    log::info!("Wrote {} rally locations to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use rally_impact_mortality::loader::{TableLayout, load};

    use super::*;

    fn rally(city: &str, state: &str, date: &str) -> RallyRecord {
        RallyRecord {
            city: city.to_string(),
            state: state.to_string(),
            date: date.parse().unwrap(),
            population: None,
        }
    }

    fn rows() -> Vec<AugmentedRally> {
        vec![
            AugmentedRally {
                rally: RallyRecord {
                    population: Some(8000),
                    ..rally("Kenosha", "WI", "2020-08-17")
                },
                county: "Kenosha County".to_string(),
                impact: ImpactResult {
                    key: CountyKey::from_raw("Kenosha, Wisconsin, US"),
                    deaths_prior: Some(100),
                    deaths_after: Some(150),
                    percent_change: Some(50.0),
                },
            },
            AugmentedRally {
                rally: rally("Latrobe", "PA", "2020-09-03"),
                county: "Sumpter County".to_string(),
                impact: ImpactResult::missing(CountyKey::from_raw("Sumpter, Pennsylvania, US")),
            },
        ]
    }

    fn written(rows: &[AugmentedRally]) -> String {
        let mut buf = Vec::new();
        write_augmented(&mut buf, rows).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn augmented_columns_and_missing_cells() {
        let text = written(&rows());
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some(
                "Id,City,State,Date,Population,County,Combined_Key,deaths_prior,deaths_after,percent_change"
            )
        );
        assert!(lines.next().unwrap().starts_with(
            "0,Kenosha,WI,2020-08-17,8000,Kenosha County,\"Kenosha, Wisconsin, US\",100,150,50"
        ));
        assert_eq!(
            lines.next(),
            Some("1,Latrobe,PA,2020-09-03,,Sumpter County,\"Sumpter, Pennsylvania, US\",,,")
        );
    }

    #[test]
    fn augmented_table_reads_back() {
        let original = rows();
        let read = read_augmented(written(&original).as_bytes()).unwrap();
        assert_eq!(read, original);
    }

    #[test]
    fn locations_use_county_centroid() {
        let mortality = load(
            "\
UID,Admin2,Province_State,Country_Region,Lat,Long_,Combined_Key,8/16/20,8/17/20
1,Kenosha,Wisconsin,US,42.58,-87.84,\"Kenosha, Wisconsin, US\",50,52
"
            .as_bytes(),
            &TableLayout::default(),
        )
        .unwrap();

        let mut buf = Vec::new();
        write_locations(&mut buf, &rows(), &mortality).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Id,City,Lat,Long_,percent_change,trend");
        assert!(lines[1].starts_with("0,Kenosha,42.58,-87.84,50"));
        assert!(lines[1].ends_with(",Increase"));
        assert_eq!(lines[2], "1,Latrobe,,,,");
    }
}
