#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County mortality time series and rally window aggregation.
//!
//! The pipeline over the JHU CSSE `time_series_covid19_deaths_US.csv` table:
//!
//! 1. [`loader::load`] parses the wide table (one column per `M/D/YY` date)
//!    into a [`MortalityTable`] of dense cumulative series keyed by
//!    [`CountyKey`].
//! 2. [`MortalityTable::to_daily_deltas`] takes the first difference of every
//!    series once, producing a [`DeltaTable`].
//! 3. [`window::sum_window`] totals a delta series over the days before or
//!    after a rally date.
//! 4. [`impact::percent_change`] turns the two totals into the reported
//!    metric; [`impact::compute_impact`] chains 3 and 4 for one rally.

pub mod dates;
pub mod delta;
pub mod impact;
pub mod loader;
pub mod table;
pub mod window;

pub use rally_impact_geography_models::CountyKey;
pub use table::{DeltaTable, MortalityTable};

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while loading or querying mortality data.
#[derive(Debug, Error)]
pub enum MortalityError {
    /// Two rows resolve to the same composite key.
    #[error("Duplicate county key '{key}' in mortality table")]
    DuplicateKey {
        /// The repeated key.
        key: CountyKey,
    },

    /// A date column header or date cell could not be parsed.
    #[error("Malformed date: '{value}'")]
    MalformedDate {
        /// The text that failed to parse.
        value: String,
    },

    /// Date columns are not in strictly ascending order.
    #[error("Date columns out of order: {next} follows {previous}")]
    UnsortedDates {
        /// The earlier column's date.
        previous: NaiveDate,
        /// The column that should have come later.
        next: NaiveDate,
    },

    /// A calendar day is missing between two date columns.
    #[error("Date columns skip from {previous} to {next}")]
    DateGap {
        /// Last date before the gap.
        previous: NaiveDate,
        /// First date after the gap.
        next: NaiveDate,
    },

    /// The table has no date columns at all.
    #[error("Mortality table has no date columns")]
    NoDateColumns,

    /// Neither the county/state/country columns nor a combined key column
    /// are present.
    #[error("Mortality table is missing key columns: {message}")]
    MissingKeyColumns {
        /// Which columns were looked for.
        message: String,
    },

    /// A row has the wrong number of fields.
    #[error("Row at line {line} has {found} fields, expected {expected}")]
    MalformedRow {
        /// 1-based line number in the source file.
        line: u64,
        /// Number of header columns.
        expected: usize,
        /// Number of fields in the row.
        found: usize,
    },

    /// A count cell is not an integer.
    #[error("Invalid count '{value}' at line {line}, column '{column}'")]
    MalformedCount {
        /// 1-based line number in the source file.
        line: u64,
        /// Header of the offending column.
        column: String,
        /// The cell text.
        value: String,
    },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
