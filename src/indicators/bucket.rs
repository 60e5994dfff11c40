// =============================================================================
// Daily Buckets - calendar-day aggregation of timestamped samples
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::IndicatorError;

/// Collects values under the UTC calendar date of their timestamp and reduces
/// each date to the arithmetic mean of what it received.
///
/// Dates that never received a value do not exist in the map, so they can
/// never surface as a zero.
#[derive(Debug, Default, Clone)]
pub struct DailyBuckets {
    buckets: BTreeMap<NaiveDate, Vec<f64>>,
}

impl DailyBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the bucket for the UTC date of `timestamp_ms`.
    pub fn push(&mut self, timestamp_ms: i64, value: f64) -> Result<NaiveDate, IndicatorError> {
        let date = utc_date(timestamp_ms)?;
        self.buckets.entry(date).or_default().push(value);
        Ok(date)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of distinct dates holding at least one value.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Finalise into `(date, mean)` pairs, ascending by date.
    pub fn into_means(self) -> Vec<(NaiveDate, f64)> {
        self.buckets
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(date, values)| {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                (date, mean)
            })
            .collect()
    }
}

/// Truncate a millisecond epoch timestamp to its UTC calendar date.
pub fn utc_date(timestamp_ms: i64) -> Result<NaiveDate, IndicatorError> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.date_naive())
        .ok_or(IndicatorError::InvalidTimestamp(timestamp_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn truncates_to_utc_day() {
        assert_eq!(utc_date(0).unwrap(), date(1970, 1, 1));
        assert_eq!(utc_date(DAY_MS - 1).unwrap(), date(1970, 1, 1));
        assert_eq!(utc_date(DAY_MS).unwrap(), date(1970, 1, 2));
        assert_eq!(utc_date(-1).unwrap(), date(1969, 12, 31));
    }

    #[test]
    fn out_of_range_timestamp_is_rejected() {
        assert_eq!(utc_date(i64::MAX), Err(IndicatorError::InvalidTimestamp(i64::MAX)));
    }

    #[test]
    fn means_per_day_sorted_ascending() {
        let mut b = DailyBuckets::new();
        b.push(2 * DAY_MS + 10, 1.0).unwrap();
        b.push(10, 0.2).unwrap();
        b.push(2 * DAY_MS + 20, 0.0).unwrap();
        b.push(20, 0.4).unwrap();
        assert_eq!(b.len(), 2);

        let means = b.into_means();
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].0, date(1970, 1, 1));
        assert!((means[0].1 - 0.3).abs() < 1e-12);
        assert_eq!(means[1].0, date(1970, 1, 3));
        assert!((means[1].1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_buckets_finalise_to_nothing() {
        let b = DailyBuckets::new();
        assert!(b.is_empty());
        assert!(b.into_means().is_empty());
    }
}
