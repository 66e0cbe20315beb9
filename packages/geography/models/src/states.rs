//! Built-in US state and territory names.
//!
//! Mirrors the `state-abbr.csv` table shipped with the analysis data so the
//! pipeline can run without it.

/// Two-letter postal abbreviations for the 50 states, DC, and the
/// inhabited territories present in the mortality dataset.
pub const STATE_ABBRS: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY", "AS", "GU", "MP", "PR", "VI",
];

/// Maps a two-letter abbreviation to the full state or territory name.
///
/// Case-insensitive. Returns `None` for unrecognized abbreviations.
#[must_use]
pub fn state_name(abbr: &str) -> Option<&'static str> {
    let name = match abbr.trim().to_uppercase().as_str() {
        "AL" => "Alabama",
        "AK" => "Alaska",
        "AZ" => "Arizona",
        "AR" => "Arkansas",
        "CA" => "California",
        "CO" => "Colorado",
        "CT" => "Connecticut",
        "DE" => "Delaware",
        "DC" => "District of Columbia",
        "FL" => "Florida",
        "GA" => "Georgia",
        "HI" => "Hawaii",
        "ID" => "Idaho",
        "IL" => "Illinois",
        "IN" => "Indiana",
        "IA" => "Iowa",
        "KS" => "Kansas",
        "KY" => "Kentucky",
        "LA" => "Louisiana",
        "ME" => "Maine",
        "MD" => "Maryland",
        "MA" => "Massachusetts",
        "MI" => "Michigan",
        "MN" => "Minnesota",
        "MS" => "Mississippi",
        "MO" => "Missouri",
        "MT" => "Montana",
        "NE" => "Nebraska",
        "NV" => "Nevada",
        "NH" => "New Hampshire",
        "NJ" => "New Jersey",
        "NM" => "New Mexico",
        "NY" => "New York",
        "NC" => "North Carolina",
        "ND" => "North Dakota",
        "OH" => "Ohio",
        "OK" => "Oklahoma",
        "OR" => "Oregon",
        "PA" => "Pennsylvania",
        "RI" => "Rhode Island",
        "SC" => "South Carolina",
        "SD" => "South Dakota",
        "TN" => "Tennessee",
        "TX" => "Texas",
        "UT" => "Utah",
        "VT" => "Vermont",
        "VA" => "Virginia",
        "WA" => "Washington",
        "WV" => "West Virginia",
        "WI" => "Wisconsin",
        "WY" => "Wyoming",
        "AS" => "American Samoa",
        "GU" => "Guam",
        "MP" => "Northern Mariana Islands",
        "PR" => "Puerto Rico",
        "VI" => "Virgin Islands",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbr_count() {
        assert_eq!(STATE_ABBRS.len(), 56);
    }

    #[test]
    fn name_coverage() {
        for abbr in STATE_ABBRS {
            assert!(state_name(abbr).is_some(), "no name for {abbr}");
        }
    }

    #[test]
    fn unknown_abbr() {
        assert_eq!(state_name("XX"), None);
        assert_eq!(state_name(""), None);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(state_name("wi"), Some("Wisconsin"));
        assert_eq!(state_name(" Va "), Some("Virginia"));
    }
}
