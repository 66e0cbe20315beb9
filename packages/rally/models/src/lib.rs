#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rally records and the per-rally results derived from them.

use chrono::NaiveDate;
pub use rally_impact_geography_models::CountyKey;
use rally_impact_mortality_models::ImpactResult;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// One campaign rally as listed in the input table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RallyRecord {
    /// City where the rally was held.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Rally date.
    pub date: NaiveDate,
    /// Reported crowd size, when known.
    pub population: Option<u64>,
}

/// A rally with the county its location geocoded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedRally {
    /// The input record.
    pub rally: RallyRecord,
    /// Geocoder county name (e.g. `"Kenosha County"`), or the configured
    /// placeholder when the geocoder returned none.
    pub county: String,
    /// Whether `county` is the placeholder rather than a geocoder answer.
    pub is_fallback: bool,
}

/// A rally joined with its before/after mortality.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedRally {
    /// The input record.
    pub rally: RallyRecord,
    /// Geocoder county name or placeholder.
    pub county: String,
    /// Join key and window totals.
    pub impact: ImpactResult,
}

impl AugmentedRally {
    /// Trend class of this rally's percent change, `None` when unmatched.
    #[must_use]
    pub fn trend(&self) -> Option<ImpactTrend> {
        self.impact.percent_change.map(ImpactTrend::classify)
    }
}

/// Direction of the change in deaths after a rally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
pub enum ImpactTrend {
    /// More deaths after than before.
    #[strum(serialize = "Increase")]
    Increase,
    /// Fewer deaths after than before.
    #[strum(serialize = "Decrease")]
    Decrease,
    /// No measurable change (includes the zero-deaths cases).
    #[strum(serialize = "No change")]
    NoChange,
}

impl ImpactTrend {
    /// Classifies a percent change.
    #[must_use]
    pub fn classify(percent_change: f64) -> Self {
        if percent_change > 0.0 {
            Self::Increase
        } else if percent_change < 0.0 {
            Self::Decrease
        } else {
            Self::NoChange
        }
    }
}

/// Distribution of percent change across rallies.
///
/// Statistics only consider rallies whose county matched the mortality
/// table. `std_dev` is the sample standard deviation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImpactSummary {
    /// Rallies in the result set.
    pub rallies: usize,
    /// Rallies without a mortality series.
    pub unmatched: usize,
    /// Mean percent change.
    pub mean: Option<f64>,
    /// Median percent change.
    pub median: Option<f64>,
    /// Sample standard deviation of percent change.
    pub std_dev: Option<f64>,
    /// Rallies followed by more deaths.
    pub increase: usize,
    /// Rallies followed by fewer deaths.
    pub decrease: usize,
    /// Rallies with no change.
    pub no_change: usize,
}

impl ImpactSummary {
    /// Summarizes the percent changes of `rows`, skipping unmatched rallies.
    #[must_use]
    pub fn from_rows(rows: &[AugmentedRally]) -> Self {
        let changes: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.impact.percent_change)
            .collect();
        Self {
            rallies: rows.len(),
            unmatched: rows.len() - changes.len(),
            ..Self::from_changes(&changes)
        }
    }

    /// Summarizes a list of percent changes, all counted as matched.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_changes(changes: &[f64]) -> Self {
        let mut summary = Self {
            rallies: changes.len(),
            ..Self::default()
        };
        if changes.is_empty() {
            return summary;
        }

        for &change in changes {
            match ImpactTrend::classify(change) {
                ImpactTrend::Increase => summary.increase += 1,
                ImpactTrend::Decrease => summary.decrease += 1,
                ImpactTrend::NoChange => summary.no_change += 1,
            }
        }

        let n = changes.len() as f64;
        let mean = changes.iter().sum::<f64>() / n;

        let mut sorted = changes.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            f64::midpoint(sorted[mid - 1], sorted[mid])
        } else {
            sorted[mid]
        };

        summary.mean = Some(mean);
        summary.median = Some(median);
        summary.std_dev = (changes.len() > 1).then(|| {
            let variance =
                changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        });
        summary
    }

    /// Rallies that contributed to the statistics.
    #[must_use]
    pub const fn matched(&self) -> usize {
        self.rallies - self.unmatched
    }

    /// Count for one trend class.
    #[must_use]
    pub const fn count(&self, trend: ImpactTrend) -> usize {
        match trend {
            ImpactTrend::Increase => self.increase,
            ImpactTrend::Decrease => self.decrease,
            ImpactTrend::NoChange => self.no_change,
        }
    }
}
