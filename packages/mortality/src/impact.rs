//! Percent-change metric for a rally's before/after windows.

use chrono::NaiveDate;
use rally_impact_geography_models::CountyKey;
use rally_impact_mortality_models::{DailyDeltaSeries, ImpactResult, WindowDirection};

use crate::window::sum_window;

/// Signed percent change from `deaths_prior` to `deaths_after`, rounded to
/// two decimal places.
///
/// Returns `0.0` when either side is zero, including the case where deaths
/// rose from zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent_change(deaths_prior: i64, deaths_after: i64) -> f64 {
    if deaths_prior == 0 || deaths_after == 0 {
        return 0.0;
    }

    let change = (deaths_after - deaths_prior) as f64 / deaths_prior as f64;
    round_to_hundredths(change * 100.0)
}

/// Rounds the exact binary value to two decimals, ties to even.
fn round_to_hundredths(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Computes the before/after totals and percent change for one rally.
///
/// `deltas` is `None` when `key` has no row in the mortality table; the
/// result then carries missing values instead of numbers.
#[must_use]
pub fn compute_impact(
    key: CountyKey,
    deltas: Option<&DailyDeltaSeries>,
    anchor: NaiveDate,
    window_days: u32,
) -> ImpactResult {
    let Some(deltas) = deltas else {
        return ImpactResult::missing(key);
    };

    let prior = sum_window(deltas, anchor, WindowDirection::Before, window_days);
    let after = sum_window(deltas, anchor, WindowDirection::After, window_days);

    ImpactResult {
        key,
        deaths_prior: Some(prior),
        deaths_after: Some(after),
        percent_change: Some(percent_change(prior, after)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::*;

    #[test]
    fn zero_inputs_yield_zero() {
        for x in [0, 1, 17, 1000, -5] {
            assert!(percent_change(0, x).abs() < f64::EPSILON);
            assert!(percent_change(x, 0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn increase_is_positive() {
        assert!((percent_change(100, 150) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decrease_is_negative_and_rounded() {
        assert!((percent_change(150, 100) - -33.33).abs() < 1e-9);
    }

    #[test]
    fn rounds_to_two_places() {
        // 2 -> 3 is +50%, 3 -> 4 is +33.333...%
        assert!((percent_change(3, 4) - 33.33).abs() < 1e-9);
        assert!((percent_change(3, 5) - 66.67).abs() < 1e-9);
    }

    #[test]
    fn half_ties_round_to_even() {
        assert!((percent_change(32, 33) - 3.12).abs() < 1e-9);
        assert!((percent_change(32, 31) - -3.12).abs() < 1e-9);
        assert!((percent_change(32, 7) - -78.12).abs() < 1e-9);
        assert!((percent_change(32, 3) - -90.62).abs() < 1e-9);
        assert!((percent_change(8, 9) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn unmatched_key_yields_missing_values() {
        let key = CountyKey::from_raw("Sumpter, Florida, US");
        let result = compute_impact(
            key.clone(),
            None,
            NaiveDate::from_ymd_opt(2020, 9, 25).unwrap(),
            60,
        );
        assert_eq!(result, ImpactResult::missing(key));
        assert!(!result.is_matched());
    }

    #[test]
    fn steady_deaths_around_rally() {
        // 5 deaths/day from 2020-06-18 through 2020-10-16, zero elsewhere.
        let start = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
        let first = NaiveDate::from_ymd_opt(2020, 6, 18).unwrap();
        let last = NaiveDate::from_ymd_opt(2020, 10, 16).unwrap();
        let deltas: Vec<i64> = (0..365u64)
            .map(|i| {
                let d = start.checked_add_days(Days::new(i)).unwrap();
                if d >= first && d <= last { 5 } else { 0 }
            })
            .collect();
        let series = DailyDeltaSeries::new(start, deltas);

        let result = compute_impact(
            CountyKey::from_raw("Kenosha, Wisconsin, US"),
            Some(&series),
            NaiveDate::from_ymd_opt(2020, 8, 17).unwrap(),
            60,
        );

        assert_eq!(result.deaths_prior, Some(305));
        assert_eq!(result.deaths_after, Some(305));
        assert_eq!(result.percent_change, Some(0.0));
    }
}
