//! Calendar aggregation of a daily series.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{
    bucket::{Bucket, Granularity},
    record::TimeSeries,
};

/// Means per calendar period, ascending by period start.
///
/// Only records carrying a value contribute. A period without any valued
/// record produces no bucket at all; gaps are not filled.
pub fn aggregate(series: &TimeSeries, granularity: Granularity) -> Vec<Bucket> {
    let mut sums: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for record in series {
        let Some(value) = record.value else { continue };
        let entry = sums
            .entry(granularity.period_start(record.date))
            .or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(period_start, (sum, count))| Bucket {
            granularity,
            period_start,
            mean_value: Some(sum / f64::from(count)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::record::RawRecord;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(records: Vec<RawRecord>) -> TimeSeries {
        TimeSeries::from_records(records).0
    }

    #[test]
    fn monthly_means() {
        let s = series(vec![
            RawRecord::new(d(2023, 1, 5), Some(60.0)),
            RawRecord::new(d(2023, 1, 20), Some(64.0)),
            RawRecord::new(d(2023, 2, 10), Some(58.0)),
        ]);
        assert_eq!(
            aggregate(&s, Granularity::Month),
            vec![
                Bucket { granularity: Granularity::Month, period_start: d(2023, 1, 1), mean_value: Some(62.0) },
                Bucket { granularity: Granularity::Month, period_start: d(2023, 2, 1), mean_value: Some(58.0) },
            ]
        );
    }

    #[test]
    fn yearly_means_span_months() {
        let s = series(vec![
            RawRecord::new(d(2022, 12, 31), Some(70.0)),
            RawRecord::new(d(2023, 1, 5), Some(60.0)),
            RawRecord::new(d(2023, 7, 20), Some(64.0)),
        ]);
        let buckets = aggregate(&s, Granularity::Year);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label(), "2022");
        assert_eq!(buckets[1].mean_value, Some(62.0));
    }

    #[test]
    fn empty_series_gives_no_buckets() {
        assert!(aggregate(&TimeSeries::new(), Granularity::Month).is_empty());
    }

    #[test]
    fn valueless_records_neither_count_nor_create_buckets() {
        let s = series(vec![
            RawRecord::new(d(2023, 1, 5), Some(60.0)),
            RawRecord::new(d(2023, 1, 6), None),
            RawRecord::new(d(2023, 3, 1), None),
        ]);
        let buckets = aggregate(&s, Granularity::Month);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].mean_value, Some(60.0));
    }

    #[test]
    fn gaps_are_not_filled() {
        let s = series(vec![
            RawRecord::new(d(2023, 1, 5), Some(1.0)),
            RawRecord::new(d(2023, 4, 5), Some(4.0)),
        ]);
        let months: Vec<_> = aggregate(&s, Granularity::Month).iter().map(Bucket::label).collect();
        assert_eq!(months, vec!["2023-01", "2023-04"]);
    }

    proptest! {
        #[test]
        fn monthly_aggregation_is_idempotent(
            points in proptest::collection::vec(
                (0i64..2_000, proptest::option::of(30.0f64..120.0)),
                0..200,
            ),
        ) {
            let records = points
                .into_iter()
                .map(|(offset, value)| RawRecord::new(d(2018, 1, 1) + chrono::Duration::days(offset), value))
                .collect();
            let once = aggregate(&series(records), Granularity::Month);
            let twice = aggregate(&TimeSeries::from_buckets(&once), Granularity::Month);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn bucket_means_stay_within_bounds(
            values in proptest::collection::vec(30.0f64..120.0, 1..31),
        ) {
            let records = values
                .iter()
                .enumerate()
                .map(|(i, v)| RawRecord::new(d(2023, 1, 1 + i as u32), Some(*v)))
                .collect();
            let buckets = aggregate(&series(records), Granularity::Month);
            prop_assert_eq!(buckets.len(), 1);
            let mean = buckets[0].mean_value.unwrap();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(mean >= min - 1e-9 && mean <= max + 1e-9);
        }
    }
}
