//! Cumulative → daily increments.

use rally_impact_mortality_models::{DailyDeltaSeries, MortalitySeries};

/// First difference of a cumulative series.
///
/// `out[i] = in[i] - in[i - 1]` for `i >= 1` and `out[0] = 0`. Downward
/// revisions in the upstream feed show up as negative deltas and are kept
/// as-is.
#[must_use]
pub fn to_daily_deltas(series: &MortalitySeries) -> DailyDeltaSeries {
    let counts = series.counts();
    let deltas = std::iter::once(0)
        .chain(counts.windows(2).map(|pair| pair[1] - pair[0]))
        .take(counts.len())
        .collect();

    DailyDeltaSeries::new(series.domain().start(), deltas)
}
