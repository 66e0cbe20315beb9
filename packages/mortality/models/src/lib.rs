#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County mortality time series and rally impact types.
//!
//! A [`MortalitySeries`] holds cumulative death counts for one county, one
//! value per calendar day. Its first difference is a [`DailyDeltaSeries`].
//! Both are dense: a start date plus a contiguous vector of values, so a
//! date maps to an index by subtraction instead of a lookup.

use chrono::{Days, NaiveDate};
use rally_impact_geography_models::CountyKey;

/// A contiguous run of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateDomain {
    start: NaiveDate,
    len: usize,
}

impl DateDomain {
    /// Creates a domain of `len` consecutive days starting at `start`.
    #[must_use]
    pub const fn new(start: NaiveDate, len: usize) -> Self {
        Self { start, len }
    }

    /// First day of the domain.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the domain, or `None` if it is empty.
    #[must_use]
    pub fn end(&self) -> Option<NaiveDate> {
        let last = self.len.checked_sub(1)?;
        self.date_at(last)
    }

    /// Number of days in the domain.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the domain has no days.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of `date` within the domain.
    #[must_use]
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = usize::try_from((date - self.start).num_days()).ok()?;
        (offset < self.len).then_some(offset)
    }

    /// Date at position `index`.
    #[must_use]
    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        if index >= self.len {
            return None;
        }
        self.start.checked_add_days(Days::new(index as u64))
    }
}

/// Cumulative death counts for one county, ascending by date, no gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MortalitySeries {
    domain: DateDomain,
    counts: Vec<i64>,
}

impl MortalitySeries {
    /// Creates a series whose first count belongs to `start`.
    #[must_use]
    pub const fn new(start: NaiveDate, counts: Vec<i64>) -> Self {
        Self {
            domain: DateDomain::new(start, counts.len()),
            counts,
        }
    }

    /// The dates covered by this series.
    #[must_use]
    pub const fn domain(&self) -> DateDomain {
        self.domain
    }

    /// Cumulative counts in date order.
    #[must_use]
    pub fn counts(&self) -> &[i64] {
        &self.counts
    }

    /// Cumulative count on `date`, if inside the domain.
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<i64> {
        self.domain.index_of(date).map(|i| self.counts[i])
    }
}

/// Daily increments derived from a [`MortalitySeries`].
///
/// Shares its source's date domain. The first entry has no prior day and is
/// stored as `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyDeltaSeries {
    domain: DateDomain,
    deltas: Vec<i64>,
}

impl DailyDeltaSeries {
    /// Creates a delta series whose first value belongs to `start`.
    #[must_use]
    pub const fn new(start: NaiveDate, deltas: Vec<i64>) -> Self {
        Self {
            domain: DateDomain::new(start, deltas.len()),
            deltas,
        }
    }

    /// The dates covered by this series.
    #[must_use]
    pub const fn domain(&self) -> DateDomain {
        self.domain
    }

    /// Daily increments in date order.
    #[must_use]
    pub fn deltas(&self) -> &[i64] {
        &self.deltas
    }

    /// Increment on `date`, if inside the domain.
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<i64> {
        self.domain.index_of(date).map(|i| self.deltas[i])
    }
}

/// Which side of the anchor date a window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDirection {
    /// `[anchor - days, anchor]`.
    Before,
    /// `[anchor, anchor + days]`.
    After,
}

/// Representative coordinates of a county (from the mortality dataset's
/// `Lat`/`Long_` columns).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountyCentroid {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

/// Before/after mortality for one rally.
///
/// The numeric fields are `None` when the rally's county has no row in the
/// mortality dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactResult {
    /// Join key the rally resolved to.
    pub key: CountyKey,
    /// Deaths in the window ending on the rally date.
    pub deaths_prior: Option<i64>,
    /// Deaths in the window starting on the rally date.
    pub deaths_after: Option<i64>,
    /// Signed percent change from prior to after, 2 decimal places.
    pub percent_change: Option<f64>,
}

impl ImpactResult {
    /// A result for a key with no matching mortality series.
    #[must_use]
    pub const fn missing(key: CountyKey) -> Self {
        Self {
            key,
            deaths_prior: None,
            deaths_after: None,
            percent_change: None,
        }
    }

    /// Whether the key was found in the mortality dataset.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.percent_change.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn domain_indexing() {
        let domain = DateDomain::new(date(2020, 1, 22), 10);
        assert_eq!(domain.index_of(date(2020, 1, 22)), Some(0));
        assert_eq!(domain.index_of(date(2020, 1, 31)), Some(9));
        assert_eq!(domain.index_of(date(2020, 2, 1)), None);
        assert_eq!(domain.index_of(date(2020, 1, 21)), None);
        assert_eq!(domain.end(), Some(date(2020, 1, 31)));
    }

    #[test]
    fn empty_domain_has_no_end() {
        let domain = DateDomain::new(date(2020, 1, 22), 0);
        assert!(domain.is_empty());
        assert_eq!(domain.end(), None);
    }

    #[test]
    fn series_lookup_crosses_leap_day() {
        let series = MortalitySeries::new(date(2020, 2, 28), vec![1, 2, 4]);
        assert_eq!(series.get(date(2020, 2, 29)), Some(2));
        assert_eq!(series.get(date(2020, 3, 1)), Some(4));
        assert_eq!(series.get(date(2020, 3, 2)), None);
    }
}
