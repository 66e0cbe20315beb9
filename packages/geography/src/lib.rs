#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! US state lookup and county join-key normalization.
//!
//! The geocoder returns county names such as `"Kenosha County"` and the
//! rally list carries two-letter state abbreviations. [`normalize`] turns
//! that pair into the [`CountyKey`] format used by the mortality dataset,
//! using a [`StateTable`] that is loaded once and only read afterwards.

pub mod normalize;
pub mod state_table;

pub use normalize::{normalize, strip_county_suffix};
pub use rally_impact_geography_models::CountyKey;
pub use state_table::StateTable;

use thiserror::Error;

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// A state abbreviation has no entry in the state table.
    #[error("Unknown state abbreviation: '{abbreviation}'")]
    UnknownState {
        /// The abbreviation as it appeared in the input.
        abbreviation: String,
    },

    /// The state table lists the same abbreviation twice.
    #[error("Duplicate state abbreviation '{abbreviation}' in state table")]
    DuplicateAbbreviation {
        /// The repeated abbreviation.
        abbreviation: String,
    },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
