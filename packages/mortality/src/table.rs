//! In-memory mortality tables keyed by [`CountyKey`].

use std::collections::BTreeMap;

use rally_impact_geography_models::CountyKey;
use rally_impact_mortality_models::{CountyCentroid, DailyDeltaSeries, DateDomain, MortalitySeries};

use crate::MortalityError;
use crate::delta::to_daily_deltas;

/// Cumulative death series for every county in the source table.
///
/// All series share one [`DateDomain`]. Built once by
/// [`crate::loader::load`] and only read afterwards.
#[derive(Debug, Clone)]
pub struct MortalityTable {
    domain: DateDomain,
    series: BTreeMap<CountyKey, MortalitySeries>,
    centroids: BTreeMap<CountyKey, CountyCentroid>,
}

impl MortalityTable {
    /// Creates an empty table over `domain`.
    #[must_use]
    pub const fn new(domain: DateDomain) -> Self {
        Self {
            domain,
            series: BTreeMap::new(),
            centroids: BTreeMap::new(),
        }
    }

    /// Adds one county's series.
    ///
    /// # Errors
    ///
    /// Returns [`MortalityError::DuplicateKey`] if `key` is already present.
    pub fn insert(
        &mut self,
        key: CountyKey,
        series: MortalitySeries,
        centroid: Option<CountyCentroid>,
    ) -> Result<(), MortalityError> {
        if self.series.contains_key(&key) {
            return Err(MortalityError::DuplicateKey { key });
        }
        if let Some(centroid) = centroid {
            self.centroids.insert(key.clone(), centroid);
        }
        self.series.insert(key, series);
        Ok(())
    }

    /// The dates shared by every series.
    #[must_use]
    pub const fn domain(&self) -> DateDomain {
        self.domain
    }

    /// The series for `key`, if the county is in the table.
    #[must_use]
    pub fn get(&self, key: &CountyKey) -> Option<&MortalitySeries> {
        self.series.get(key)
    }

    /// The county's representative coordinates, when the source had them.
    #[must_use]
    pub fn centroid(&self, key: &CountyKey) -> Option<CountyCentroid> {
        self.centroids.get(key).copied()
    }

    /// Number of counties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the table has no counties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Converts every cumulative series into daily increments.
    #[must_use]
    pub fn to_daily_deltas(&self) -> DeltaTable {
        let series = self
            .series
            .iter()
            .map(|(key, s)| (key.clone(), to_daily_deltas(s)))
            .collect();
        DeltaTable { series }
    }
}

/// Daily death increments for every county, derived from a
/// [`MortalityTable`].
#[derive(Debug, Clone, Default)]
pub struct DeltaTable {
    series: BTreeMap<CountyKey, DailyDeltaSeries>,
}

impl DeltaTable {
    /// The delta series for `key`, if the county is in the table.
    #[must_use]
    pub fn get(&self, key: &CountyKey) -> Option<&DailyDeltaSeries> {
        self.series.get(key)
    }

    /// Number of counties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the table has no counties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<(CountyKey, DailyDeltaSeries)> for DeltaTable {
    fn from_iter<I: IntoIterator<Item = (CountyKey, DailyDeltaSeries)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 22).unwrap()
    }

    #[test]
    fn rejects_duplicate_insert() {
        let mut table = MortalityTable::new(DateDomain::new(start(), 2));
        let key = CountyKey::from_raw("Kenosha, Wisconsin, US");
        table
            .insert(key.clone(), MortalitySeries::new(start(), vec![1, 2]), None)
            .unwrap();
        let err = table
            .insert(key, MortalitySeries::new(start(), vec![1, 2]), None)
            .unwrap_err();
        assert!(matches!(err, MortalityError::DuplicateKey { .. }));
    }

    #[test]
    fn deltas_cover_every_county() {
        let mut table = MortalityTable::new(DateDomain::new(start(), 3));
        let a = CountyKey::from_raw("A, Wisconsin, US");
        let b = CountyKey::from_raw("B, Wisconsin, US");
        table
            .insert(a.clone(), MortalitySeries::new(start(), vec![1, 4, 4]), None)
            .unwrap();
        table
            .insert(b.clone(), MortalitySeries::new(start(), vec![0, 0, 2]), None)
            .unwrap();

        let deltas = table.to_daily_deltas();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas.get(&a).unwrap().deltas(), &[0, 3, 0]);
        assert_eq!(deltas.get(&b).unwrap().deltas(), &[0, 0, 2]);
        assert!(deltas.get(&CountyKey::from_raw("C, Wisconsin, US")).is_none());
    }
}
