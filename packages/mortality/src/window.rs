//! Before/after window sums around an anchor date.
//!
//! Both windows include the anchor day itself, so a death reported on the
//! rally date counts toward the prior and the after totals alike. Bounds
//! that fall outside the series are clipped to the dates it covers.

use chrono::{Days, NaiveDate};
use rally_impact_mortality_models::{DailyDeltaSeries, WindowDirection};

/// Inclusive date bounds of a window, before clipping.
#[must_use]
pub fn window_bounds(
    anchor: NaiveDate,
    direction: WindowDirection,
    window_days: u32,
) -> (NaiveDate, NaiveDate) {
    let span = Days::new(u64::from(window_days));
    match direction {
        WindowDirection::Before => (
            anchor.checked_sub_days(span).unwrap_or(NaiveDate::MIN),
            anchor,
        ),
        WindowDirection::After => (
            anchor,
            anchor.checked_add_days(span).unwrap_or(NaiveDate::MAX),
        ),
    }
}

/// Sums daily deltas over the window on `direction`'s side of `anchor`.
///
/// * `Before`: `[anchor - window_days, anchor]`
/// * `After`: `[anchor, anchor + window_days]`
///
/// Returns `0` when the window does not overlap the series at all.
#[must_use]
pub fn sum_window(
    deltas: &DailyDeltaSeries,
    anchor: NaiveDate,
    direction: WindowDirection,
    window_days: u32,
) -> i64 {
    let domain = deltas.domain();
    let Some(last) = domain.end() else {
        return 0;
    };

    let (from, to) = window_bounds(anchor, direction, window_days);
    let from = from.max(domain.start());
    let to = to.min(last);
    if from > to {
        return 0;
    }

    match (domain.index_of(from), domain.index_of(to)) {
        (Some(lo), Some(hi)) => deltas.deltas()[lo..=hi].iter().sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Deltas `1, 2, 3, ...` starting on 2020-03-01.
    fn ramp(len: usize) -> DailyDeltaSeries {
        DailyDeltaSeries::new(date(2020, 3, 1), (1..=len as i64).collect())
    }

    #[test]
    fn before_window_is_inclusive() {
        let deltas = ramp(10);
        // 2020-03-03 ..= 2020-03-05 -> 3 + 4 + 5
        assert_eq!(
            sum_window(&deltas, date(2020, 3, 5), WindowDirection::Before, 2),
            12
        );
    }

    #[test]
    fn after_window_is_inclusive() {
        let deltas = ramp(10);
        // 2020-03-05 ..= 2020-03-07 -> 5 + 6 + 7
        assert_eq!(
            sum_window(&deltas, date(2020, 3, 5), WindowDirection::After, 2),
            18
        );
    }

    #[test]
    fn anchor_day_counts_in_both_windows() {
        let deltas = ramp(10);
        let anchor = date(2020, 3, 5);
        let before = sum_window(&deltas, anchor, WindowDirection::Before, 0);
        let after = sum_window(&deltas, anchor, WindowDirection::After, 0);
        assert_eq!(before, 5);
        assert_eq!(after, 5);
    }

    #[test]
    fn clips_to_series_start() {
        let deltas = ramp(10);
        // Window reaches back to February; only 03-01..=03-02 exist.
        assert_eq!(
            sum_window(&deltas, date(2020, 3, 2), WindowDirection::Before, 60),
            3
        );
    }

    #[test]
    fn clips_to_series_end() {
        let deltas = ramp(10);
        // 03-09..=03-10 -> 9 + 10
        assert_eq!(
            sum_window(&deltas, date(2020, 3, 9), WindowDirection::After, 60),
            19
        );
    }

    #[test]
    fn window_outside_domain_is_zero() {
        let deltas = ramp(10);
        assert_eq!(
            sum_window(&deltas, date(2020, 6, 1), WindowDirection::After, 5),
            0
        );
        assert_eq!(
            sum_window(&deltas, date(2020, 1, 1), WindowDirection::Before, 5),
            0
        );
    }

    #[test]
    fn anchor_outside_domain_still_overlaps() {
        let deltas = ramp(10);
        // Anchor after the last day, but the before window reaches back into it.
        assert_eq!(
            sum_window(&deltas, date(2020, 3, 12), WindowDirection::Before, 3),
            19
        );
    }

    #[test]
    fn all_zero_deltas_sum_to_zero() {
        let deltas = DailyDeltaSeries::new(date(2020, 1, 22), vec![0; 300]);
        for window_days in [0, 1, 7, 60, 400] {
            for offset in [0u64, 30, 150, 299, 500] {
                let anchor = date(2020, 1, 22).checked_add_days(Days::new(offset)).unwrap();
                assert_eq!(
                    sum_window(&deltas, anchor, WindowDirection::Before, window_days),
                    0
                );
                assert_eq!(
                    sum_window(&deltas, anchor, WindowDirection::After, window_days),
                    0
                );
            }
        }
    }

    #[test]
    fn empty_series_sums_to_zero() {
        let deltas = DailyDeltaSeries::new(date(2020, 1, 22), vec![]);
        assert_eq!(
            sum_window(&deltas, date(2020, 1, 22), WindowDirection::After, 10),
            0
        );
    }
}
