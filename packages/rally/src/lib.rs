#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rally dataset builder.
//!
//! Chains the pieces of the analysis for a list of rallies:
//!
//! 1. [`input::read_rallies`] + [`input::dedup_exact`]: load the rally list
//!    and drop exact duplicate rows.
//! 2. [`resolve::resolve_counties`]: geocode each `"City, ST"` to a county
//!    (async, bounded concurrency, placeholder county on a miss).
//! 3. [`build::build_augmented`]: normalize to a join key, look up the
//!    county's daily deaths, and compute the before/after windows and
//!    percent change.
//! 4. [`output`] / [`summary`]: write the augmented table and rally
//!    locations, and summarize the distribution of percent change.
//!
//! [`analyze`] runs steps 2 and 3 end to end.

pub mod build;
pub mod input;
pub mod output;
pub mod progress;
pub mod resolve;
pub mod summary;

use std::sync::Arc;

use rally_impact_geocoder::{GeocodeError, Geocoder};
use rally_impact_geography::{GeographyError, StateTable};
use rally_impact_mortality::{MortalityError, MortalityTable};
use rally_impact_rally_models::{AugmentedRally, RallyRecord};
use thiserror::Error;

use crate::progress::ProgressCallback;

/// Days on each side of a rally that count toward its totals.
pub const DEFAULT_WINDOW_DAYS: u32 = 60;

/// County name used when the geocoder returns none for a location.
///
/// It deliberately matches no county in the mortality data, so affected
/// rallies end up with missing totals.
pub const DEFAULT_FALLBACK_COUNTY: &str = "Sumpter County";

/// Run-wide analysis settings.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Window size in days for both the prior and after totals.
    pub window_days: u32,
    /// Geocoding pacing and the placeholder county.
    pub resolve: resolve::ResolveOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            resolve: resolve::ResolveOptions::default(),
        }
    }
}

/// Errors that can occur while building the rally dataset.
#[derive(Debug, Error)]
pub enum RallyError {
    /// State lookup or state table failure.
    #[error(transparent)]
    Geography(#[from] GeographyError),

    /// Mortality table failure or malformed rally date.
    #[error(transparent)]
    Mortality(#[from] MortalityError),

    /// Geocoding a rally location failed.
    #[error("Geocoding '{query}' failed: {source}")]
    Geocode {
        /// The `"City, ST"` query.
        query: String,
        /// Underlying geocoder error.
        #[source]
        source: GeocodeError,
    },

    /// A required column is absent from the rally table.
    #[error("Rally table is missing column '{column}'")]
    MissingColumn {
        /// Header that was looked for.
        column: String,
    },

    /// A required cell is empty or the missing-value sentinel.
    #[error("Missing value for '{column}' at line {line}")]
    MissingValue {
        /// 1-based line number in the source file.
        line: u64,
        /// Header of the column.
        column: String,
    },

    /// A population cell is not a whole number.
    #[error("Invalid population '{value}' at line {line}")]
    MalformedPopulation {
        /// 1-based line number in the source file.
        line: u64,
        /// The cell text.
        value: String,
    },

    /// CSV parsing or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RallyError {
    /// Whether rerunning could succeed without changing the inputs.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Geocode { source, .. } if source.is_transient())
    }
}

/// Geocodes `rallies` and computes each one's before/after mortality.
///
/// The daily-delta transform runs once over the whole mortality table
/// before any rally is aggregated. Rows come back in input order.
///
/// # Errors
///
/// Returns [`RallyError::Geocode`] if a lookup still fails after retries and
/// [`RallyError::Geography`] if a rally's state abbreviation is unknown;
/// either aborts the whole batch.
pub async fn analyze(
    rallies: Vec<RallyRecord>,
    geocoder: &dyn Geocoder,
    states: &StateTable,
    mortality: &MortalityTable,
    config: &AnalysisConfig,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Result<Vec<AugmentedRally>, RallyError> {
    let located = resolve::resolve_counties(rallies, geocoder, &config.resolve, progress).await?;

    let deltas = mortality.to_daily_deltas();
    log::info!(
        "Computed daily deaths for {} counties; aggregating {} rallies with a {}-day window",
        deltas.len(),
        located.len(),
        config.window_days
    );

    build::build_augmented(&located, states, &deltas, config.window_days)
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};
    use rally_impact_geocoder::lookup::LookupGeocoder;
    use rally_impact_mortality::loader::{TableLayout, load};

    use super::*;

    /// Kenosha with 5 more deaths every day for 200 days from 2020-06-01.
    fn mortality() -> MortalityTable {
        let start = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let dates: Vec<String> = (0..200)
            .map(|i| {
                start
                    .checked_add_days(Days::new(i))
                    .unwrap()
                    .format("%-m/%-d/%y")
                    .to_string()
            })
            .collect();
        let counts: Vec<String> = (0..200).map(|i| (1000 + 5 * i).to_string()).collect();

        let csv = format!(
            "Admin2,Province_State,Country_Region,Lat,Long_,{}\n\
             Kenosha,Wisconsin,US,42.58,-87.84,{}\n",
            dates.join(","),
            counts.join(",")
        );
        load(csv.as_bytes(), &TableLayout::default()).unwrap()
    }

    #[tokio::test]
    async fn analyzes_rallies_end_to_end() {
        let geocoder = LookupGeocoder::from_reader(
            "City,State,County\nKenosha,WI,Kenosha County\nLatrobe,PA,\n".as_bytes(),
        )
        .unwrap();
        let rallies = input::dedup_exact(
            input::read_rallies(
                "City,State,Date\n\
                 Kenosha,WI,2020-09-09\n\
                 Kenosha,WI,2020-09-09\n\
                 Latrobe,PA,2020-09-03\n"
                    .as_bytes(),
            )
            .unwrap(),
        );

        let rows = analyze(
            rallies,
            &geocoder,
            &StateTable::builtin(),
            &mortality(),
            &AnalysisConfig::default(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(rows.len(), 2);

        // 2020-09-09 is day 100; both 61-day windows sum to 305.
        assert_eq!(rows[0].impact.key.as_str(), "Kenosha, Wisconsin, US");
        assert_eq!(rows[0].impact.deaths_prior, Some(305));
        assert_eq!(rows[0].impact.deaths_after, Some(305));
        assert_eq!(rows[0].impact.percent_change, Some(0.0));

        assert_eq!(rows[1].county, DEFAULT_FALLBACK_COUNTY);
        assert!(!rows[1].impact.is_matched());
    }

    #[tokio::test]
    async fn unknown_state_aborts_analysis() {
        let geocoder =
            LookupGeocoder::from_reader("City,State,County\nSpringfield,ZZ,Clark County\n".as_bytes())
                .unwrap();
        let rallies = vec![RallyRecord {
            city: "Springfield".to_string(),
            state: "ZZ".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 9, 9).unwrap(),
            population: None,
        }];

        let err = analyze(
            rallies,
            &geocoder,
            &StateTable::builtin(),
            &mortality(),
            &AnalysisConfig::default(),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RallyError::Geography(_)));
    }
}
