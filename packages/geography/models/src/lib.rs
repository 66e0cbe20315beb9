#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County join key and US state types.
//!
//! A [`CountyKey`] is the canonical string that identifies one county-level
//! row in the mortality dataset, e.g. `"Kenosha, Wisconsin, US"`. Rally
//! records are resolved to the same format so that the two datasets can be
//! joined by exact string match.

pub mod states;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Country label appended to every US county key.
pub const US_COUNTRY: &str = "US";

/// Separator between the parts of a composite key.
pub const KEY_SEPARATOR: &str = ", ";

/// Canonical composite key, `"<County>, <State>, <Country>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountyKey(String);

impl CountyKey {
    /// Builds a key from already-normalized parts.
    ///
    /// Empty parts are skipped, so territories without a county
    /// (`"", "Guam", "US"`) produce `"Guam, US"` like the source dataset.
    #[must_use]
    pub fn from_parts(county: &str, state: &str, country: &str) -> Self {
        let joined = [county, state, country]
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR);
        Self(joined)
    }

    /// Wraps a key string that is already in canonical form (e.g. the
    /// `Combined_Key` column of the source dataset).
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CountyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_parts() {
        let key = CountyKey::from_parts("Kenosha", "Wisconsin", US_COUNTRY);
        assert_eq!(key.as_str(), "Kenosha, Wisconsin, US");
    }

    #[test]
    fn skips_empty_parts() {
        let key = CountyKey::from_parts("", "Guam", US_COUNTRY);
        assert_eq!(key.as_str(), "Guam, US");
    }

    #[test]
    fn raw_is_trimmed() {
        assert_eq!(
            CountyKey::from_raw("  Maricopa, Arizona, US ").as_str(),
            "Maricopa, Arizona, US"
        );
    }
}
