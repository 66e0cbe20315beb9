//! County name → [`CountyKey`] normalization.

use rally_impact_geography_models::{CountyKey, US_COUNTRY};

use crate::{GeographyError, StateTable};

/// Administrative suffixes the geocoder appends to county names.
///
/// Only one is ever stripped.
const COUNTY_SUFFIXES: &[&str] = &[" County", " Parish"];

/// Removes a single trailing administrative suffix (`" County"`,
/// `" Parish"`) and surrounding whitespace from a geocoder county name.
///
/// Names without a known suffix are returned trimmed but otherwise intact.
#[must_use]
pub fn strip_county_suffix(county_name: &str) -> &str {
    let trimmed = county_name.trim();
    COUNTY_SUFFIXES
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .unwrap_or(trimmed)
        .trim_end()
}

/// Builds the mortality-dataset join key for a geocoded county.
///
/// `normalize("Kenosha County", "WI", &states)` yields
/// `"Kenosha, Wisconsin, US"`.
///
/// # Errors
///
/// Returns [`GeographyError::UnknownState`] if `state_abbrev` is not in
/// `states`.
pub fn normalize(
    county_name: &str,
    state_abbrev: &str,
    states: &StateTable,
) -> Result<CountyKey, GeographyError> {
    let state = states.full_name(state_abbrev)?;
    Ok(CountyKey::from_parts(
        strip_county_suffix(county_name),
        state,
        US_COUNTRY,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_kenosha() {
        let key = normalize("Kenosha County", "WI", &StateTable::builtin()).unwrap();
        assert_eq!(key.as_str(), "Kenosha, Wisconsin, US");
    }

    #[test]
    fn strips_parish() {
        let key = normalize("Orleans Parish", "LA", &StateTable::builtin()).unwrap();
        assert_eq!(key.as_str(), "Orleans, Louisiana, US");
    }

    #[test]
    fn strips_only_one_suffix() {
        assert_eq!(strip_county_suffix("County County"), "County");
    }

    #[test]
    fn keeps_names_without_suffix() {
        assert_eq!(strip_county_suffix(" Newport News "), "Newport News");
        assert_eq!(strip_county_suffix("Carson City"), "Carson City");
    }

    #[test]
    fn fails_on_unknown_state() {
        let err = normalize("Kenosha County", "XX", &StateTable::builtin()).unwrap_err();
        assert!(matches!(err, GeographyError::UnknownState { .. }));
    }

    #[test]
    fn placeholder_county_builds_a_key() {
        let key = normalize("Sumpter County", "FL", &StateTable::builtin()).unwrap();
        assert_eq!(key.as_str(), "Sumpter, Florida, US");
    }
}
