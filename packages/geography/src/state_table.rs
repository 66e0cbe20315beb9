//! Abbreviation → full state name table.
//!
//! Loaded from a two-column `Abbr,State` CSV (the `state-abbr.csv` file
//! distributed with the rally data) or built from the compiled-in list in
//! [`rally_impact_geography_models::states`].

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use rally_impact_geography_models::states::{STATE_ABBRS, state_name};
use serde::Deserialize;

use crate::GeographyError;

#[derive(Debug, Deserialize)]
struct StateRow {
    #[serde(rename = "Abbr")]
    abbr: String,
    #[serde(rename = "State")]
    state: String,
}

/// Read-only mapping from two-letter abbreviation to full state name.
///
/// Keys are stored upper-cased; lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct StateTable {
    names: BTreeMap<String, String>,
}

impl StateTable {
    /// Builds the table from the compiled-in list of states and territories.
    #[must_use]
    pub fn builtin() -> Self {
        let names = STATE_ABBRS
            .iter()
            .filter_map(|abbr| state_name(abbr).map(|name| ((*abbr).to_string(), name.to_string())))
            .collect();
        Self { names }
    }

    /// Reads an `Abbr,State` table. Lines starting with `#` are skipped and
    /// both fields are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::DuplicateAbbreviation`] if an abbreviation
    /// appears twice, or [`GeographyError::Csv`] on malformed input.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeographyError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut names = BTreeMap::new();
        for row in csv_reader.deserialize() {
            let row: StateRow = row?;
            let abbr = row.abbr.to_uppercase();
            if names.insert(abbr.clone(), row.state).is_some() {
                return Err(GeographyError::DuplicateAbbreviation { abbreviation: abbr });
            }
        }

        log::info!("Loaded {} state abbreviations", names.len());

        Ok(Self { names })
    }

    /// Reads an `Abbr,State` table from a file.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the file cannot be opened or parsed.
    pub fn from_path(path: &Path) -> Result<Self, GeographyError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Resolves an abbreviation to its full name.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::UnknownState`] if the abbreviation is not in
    /// the table.
    pub fn full_name(&self, abbreviation: &str) -> Result<&str, GeographyError> {
        self.names
            .get(&abbreviation.trim().to_uppercase())
            .map(String::as_str)
            .ok_or_else(|| GeographyError::UnknownState {
                abbreviation: abbreviation.to_string(),
            })
    }

    /// Number of abbreviations in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_all_abbrs() {
        let table = StateTable::builtin();
        assert_eq!(table.len(), STATE_ABBRS.len());
        assert_eq!(table.full_name("VA").unwrap(), "Virginia");
    }

    #[test]
    fn reads_csv_with_comments_and_padding() {
        let data = "# US states\nAbbr, State\nWI,  Wisconsin \n va , Virginia\n";
        let table = StateTable::from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.full_name("WI").unwrap(), "Wisconsin");
        assert_eq!(table.full_name("va").unwrap(), "Virginia");
    }

    #[test]
    fn rejects_duplicate_abbreviation() {
        let data = "Abbr,State\nWI,Wisconsin\nwi,Wisconsin\n";
        let err = StateTable::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            GeographyError::DuplicateAbbreviation { abbreviation } if abbreviation == "WI"
        ));
    }

    #[test]
    fn unknown_state_is_an_error() {
        let table = StateTable::builtin();
        let err = table.full_name("ZZ").unwrap_err();
        assert!(matches!(err, GeographyError::UnknownState { abbreviation } if abbreviation == "ZZ"));
    }
}
