//! Joins located rallies with county mortality.

use rally_impact_geography::{StateTable, normalize};
use rally_impact_mortality::DeltaTable;
use rally_impact_mortality::impact::compute_impact;
use rally_impact_rally_models::{AugmentedRally, LocatedRally};

use crate::RallyError;

/// Computes before/after deaths and percent change for every rally.
///
/// Rallies whose key has no mortality series keep their row with missing
/// totals. Output order matches `located`.
///
/// # Errors
///
/// Returns [`RallyError::Geography`] for the first rally whose state
/// abbreviation is not in `states`. No rows are returned in that case.
pub fn build_augmented(
    located: &[LocatedRally],
    states: &StateTable,
    deltas: &DeltaTable,
    window_days: u32,
) -> Result<Vec<AugmentedRally>, RallyError> {
    let mut unmatched = 0_usize;
    let mut rows = Vec::with_capacity(located.len());

    for entry in located {
        let key = normalize(&entry.county, &entry.rally.state, states)?;
        let series = deltas.get(&key);
        if series.is_none() {
            unmatched += 1;
            log::warn!(
                "No mortality series for '{key}' ({}, {} on {})",
                entry.rally.city,
                entry.rally.state,
                entry.rally.date
            );
        }

        rows.push(AugmentedRally {
            rally: entry.rally.clone(),
            county: entry.county.clone(),
            impact: compute_impact(key, series, entry.rally.date, window_days),
        });
    }

    log::info!(
        "Aggregated {} rallies ({unmatched} without mortality data)",
        rows.len()
    );

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};
    use rally_impact_geography::GeographyError;
    use rally_impact_mortality::CountyKey;
    use rally_impact_mortality_models::DailyDeltaSeries;
    use rally_impact_rally_models::RallyRecord;

    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()
    }

    fn located(county: &str, state: &str, date: NaiveDate) -> LocatedRally {
        LocatedRally {
            rally: RallyRecord {
                city: "Kenosha".to_string(),
                state: state.to_string(),
                date,
                population: None,
            },
            county: county.to_string(),
            is_fallback: false,
        }
    }

    /// Kenosha with 5 deaths a day for 200 days.
    fn kenosha_deltas() -> DeltaTable {
        let mut deltas = vec![5; 200];
        deltas[0] = 0;
        [(
            CountyKey::from_raw("Kenosha, Wisconsin, US"),
            DailyDeltaSeries::new(start(), deltas),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn steady_deaths_show_no_change() {
        let rally_date = start().checked_add_days(Days::new(100)).unwrap();
        let rows = build_augmented(
            &[located("Kenosha County", "WI", rally_date)],
            &StateTable::builtin(),
            &kenosha_deltas(),
            60,
        )
        .unwrap();

        let impact = &rows[0].impact;
        assert_eq!(impact.key.as_str(), "Kenosha, Wisconsin, US");
        assert_eq!(impact.deaths_prior, Some(305));
        assert_eq!(impact.deaths_after, Some(305));
        assert_eq!(impact.percent_change, Some(0.0));
        assert_eq!(rows[0].county, "Kenosha County");
    }

    #[test]
    fn unmatched_county_keeps_row() {
        let rally_date = start().checked_add_days(Days::new(100)).unwrap();
        let rows = build_augmented(
            &[
                located("Sumpter County", "WI", rally_date),
                located("Kenosha County", "WI", rally_date),
            ],
            &StateTable::builtin(),
            &kenosha_deltas(),
            60,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].impact.key.as_str(), "Sumpter, Wisconsin, US");
        assert!(!rows[0].impact.is_matched());
        assert!(rows[0].trend().is_none());
        assert!(rows[1].impact.is_matched());
    }

    #[test]
    fn unknown_state_halts() {
        let err = build_augmented(
            &[located("Kenosha County", "XX", start())],
            &StateTable::builtin(),
            &kenosha_deltas(),
            60,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RallyError::Geography(GeographyError::UnknownState { .. })
        ));
    }
}
