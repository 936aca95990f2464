//! Collapses a sub-daily forecast time series into one entry per calendar day.
//!
//! The first usable sample seen for a date represents that date, even when it
//! is the midnight slot rather than midday. Input order is trusted and never
//! re-sorted; providers already deliver samples in ascending time order.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::collections::HashSet;

use crate::model::{DailyForecast, ForecastSample};

/// Number of days shown by default.
pub const DEFAULT_HORIZON: usize = 5;

/// Longest horizon the configuration accepts. Both providers return five days
/// of samples, so a longer horizon would never be filled.
pub const MAX_HORIZON: usize = 5;

/// Reduce `samples` to at most `horizon` days, using the local time zone of
/// the running process to decide which calendar day a sample belongs to.
pub fn reduce<I>(samples: I, horizon: usize) -> Vec<DailyForecast>
where
    I: IntoIterator<Item = ForecastSample>,
{
    reduce_in(samples, horizon, &Local)
}

/// Same as [`reduce`], with calendar days taken in `tz`.
pub fn reduce_in<I, Tz>(samples: I, horizon: usize, tz: &Tz) -> Vec<DailyForecast>
where
    I: IntoIterator<Item = ForecastSample>,
    Tz: TimeZone,
{
    let mut emitted: HashSet<NaiveDate> = HashSet::new();
    let mut days = Vec::new();

    for sample in samples {
        if days.len() >= horizon {
            break;
        }

        let Some(date) = usable_date(&sample, tz) else {
            tracing::debug!(timestamp = sample.timestamp, "skipping malformed forecast sample");
            continue;
        };

        if !emitted.insert(date) {
            continue;
        }

        days.push(DailyForecast {
            date,
            temperature_max: sample.temperature_max,
            temperature_min: sample.temperature_min,
            condition_description: sample.condition_description,
            condition_icon: sample.condition_icon,
        });
    }

    days
}

/// Calendar date of a sample, or `None` when the sample can't be used.
fn usable_date<Tz: TimeZone>(sample: &ForecastSample, tz: &Tz) -> Option<NaiveDate> {
    if !sample.temperature_max.is_finite() || !sample.temperature_min.is_finite() {
        return None;
    }

    DateTime::from_timestamp(sample.timestamp, 0).map(|utc| utc.with_timezone(tz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn ts(day: u32, hour: u32) -> i64 {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap().timestamp()
    }

    fn sample(timestamp: i64, label: &str) -> ForecastSample {
        ForecastSample {
            timestamp,
            temperature_max: 20.0,
            temperature_min: 10.0,
            condition_description: label.to_string(),
            condition_icon: "01d".to_string(),
        }
    }

    fn dates(days: &[DailyForecast]) -> Vec<u32> {
        use chrono::Datelike;
        days.iter().map(|d| d.date.day()).collect()
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(reduce_in(Vec::<ForecastSample>::new(), DEFAULT_HORIZON, &Utc).is_empty());
        assert!(reduce(Vec::<ForecastSample>::new(), DEFAULT_HORIZON).is_empty());
    }

    #[test]
    fn horizon_zero_gives_empty_output() {
        let samples = vec![sample(ts(1, 0), "a")];
        assert!(reduce_in(samples, 0, &Utc).is_empty());
    }

    #[test]
    fn huge_horizon_is_bounded_by_input() {
        assert!(reduce_in(Vec::<ForecastSample>::new(), usize::MAX, &Utc).is_empty());

        let samples = vec![sample(ts(1, 0), "d1"), sample(ts(2, 0), "d2")];
        let days = reduce_in(samples, usize::MAX / 2, &Utc);
        assert_eq!(dates(&days), vec![1, 2]);
    }

    #[test]
    fn six_days_capped_to_five_in_first_seen_order() {
        let samples = vec![
            sample(ts(1, 0), "d1"),
            sample(ts(1, 3), "d1-late"),
            sample(ts(2, 0), "d2"),
            sample(ts(3, 0), "d3"),
            sample(ts(3, 3), "d3-b"),
            sample(ts(3, 6), "d3-c"),
            sample(ts(4, 0), "d4"),
            sample(ts(5, 0), "d5"),
            sample(ts(6, 0), "d6"),
        ];

        let days = reduce_in(samples, 5, &Utc);

        assert_eq!(dates(&days), vec![1, 2, 3, 4, 5]);
        let labels: Vec<_> = days.iter().map(|d| d.condition_description.as_str()).collect();
        assert_eq!(labels, vec!["d1", "d2", "d3", "d4", "d5"]);
    }

    #[test]
    fn returns_min_of_distinct_days_and_horizon() {
        for k in 0..8u32 {
            let samples: Vec<_> = (1..=k)
                .flat_map(|day| (0..24).step_by(3).map(move |hour| sample(ts(day, hour), "x")))
                .collect();

            let days = reduce_in(samples, DEFAULT_HORIZON, &Utc);

            assert_eq!(days.len(), (k as usize).min(DEFAULT_HORIZON));
            let expected: Vec<u32> = (1..=k).take(DEFAULT_HORIZON).collect();
            assert_eq!(dates(&days), expected);
        }
    }

    #[test]
    fn first_sample_of_a_day_wins_even_at_midnight() {
        let mut noon = sample(ts(7, 12), "noon");
        noon.temperature_max = 25.0;
        let samples = vec![sample(ts(7, 0), "midnight"), noon];

        let days = reduce_in(samples, DEFAULT_HORIZON, &Utc);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].condition_description, "midnight");
        assert_eq!(days[0].temperature_max, 20.0);
    }

    #[test]
    fn does_not_resort_input() {
        let samples = vec![sample(ts(3, 0), "d3"), sample(ts(1, 0), "d1"), sample(ts(2, 0), "d2")];

        let days = reduce_in(samples, DEFAULT_HORIZON, &Utc);

        assert_eq!(dates(&days), vec![3, 1, 2]);
    }

    #[test]
    fn calendar_day_follows_time_zone() {
        // 23:00 UTC on the 19th is already the 20th at UTC+2.
        let samples = vec![sample(ts(19, 21), "a"), sample(ts(19, 23), "b")];

        let utc_days = reduce_in(samples.clone(), DEFAULT_HORIZON, &Utc);
        assert_eq!(dates(&utc_days), vec![19]);

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_days = reduce_in(samples, DEFAULT_HORIZON, &plus_two);
        assert_eq!(dates(&local_days), vec![19, 20]);
        assert_eq!(local_days[1].condition_description, "b");
    }

    #[test]
    fn malformed_samples_are_skipped() {
        let mut nan_temp = sample(ts(1, 0), "nan");
        nan_temp.temperature_min = f64::NAN;
        let out_of_range = sample(i64::MAX, "overflow");

        let samples = vec![nan_temp, out_of_range, sample(ts(1, 3), "good"), sample(ts(2, 0), "d2")];

        let days = reduce_in(samples, DEFAULT_HORIZON, &Utc);

        assert_eq!(dates(&days), vec![1, 2]);
        assert_eq!(days[0].condition_description, "good");
    }

    #[test]
    fn copies_sample_fields() {
        let input = ForecastSample {
            timestamp: ts(9, 6),
            temperature_max: 14.6,
            temperature_min: 8.2,
            condition_description: "light rain".into(),
            condition_icon: "10d".into(),
        };

        let days = reduce_in(vec![input], DEFAULT_HORIZON, &Utc);

        assert_eq!(
            days,
            vec![DailyForecast {
                date: NaiveDate::from_ymd_opt(2026, 10, 9).unwrap(),
                temperature_max: 14.6,
                temperature_min: 8.2,
                condition_description: "light rain".into(),
                condition_icon: "10d".into(),
            }]
        );
    }
}
