use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::error::{WellnessError, WellnessResult};
use crate::models::{Baseline, Category, MetricSample, WeeklyAggregate};

pub const DAYS_PER_WEEK: i64 = 7;

pub fn shift_days(date: NaiveDate, days: i64) -> WellnessResult<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .ok_or(WellnessError::DateOutOfRange(date))
}

fn mean_in_range(
    category: Category,
    samples: &[MetricSample],
    start: NaiveDate,
    end_exclusive: NaiveDate,
) -> Option<f64> {
    let (total, count) = samples
        .iter()
        .filter(|s| s.category == category && s.date >= start && s.date < end_exclusive)
        .fold((0.0, 0usize), |(total, count), s| (total + s.raw_value, count + 1));

    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

pub fn weekly_aggregate(
    category: Category,
    samples: &[MetricSample],
    week_start: NaiveDate,
) -> WellnessResult<Option<WeeklyAggregate>> {
    let next_week = shift_days(week_start, DAYS_PER_WEEK)?;
    let week_end = shift_days(week_start, DAYS_PER_WEEK - 1)?;
    Ok(
        mean_in_range(category, samples, week_start, next_week).map(|mean_value| WeeklyAggregate {
            category,
            week_start,
            week_end,
            mean_value,
        }),
    )
}

/// One mean per seven-day block of `[current_week_start - window_days, current_week_start)`,
/// counted back from `current_week_start`. Empty blocks are skipped.
pub fn build_baseline(
    category: Category,
    samples: &[MetricSample],
    current_week_start: NaiveDate,
    window_days: i64,
    min_weeks: usize,
) -> WellnessResult<Baseline> {
    let window_start = shift_days(current_week_start, -window_days)?;
    let window_end = shift_days(current_week_start, -1)?;

    let mut weekly_means = Vec::new();
    let mut sub_end = current_week_start;
    while sub_end > window_start {
        let sub_start = shift_days(sub_end, -DAYS_PER_WEEK)
            .map_or(window_start, |start| start.max(window_start));
        if let Some(mean) = mean_in_range(category, samples, sub_start, sub_end) {
            weekly_means.push(mean);
        }
        sub_end = sub_start;
    }

    if weekly_means.len() < min_weeks {
        debug!(
            %category,
            observed = weekly_means.len(),
            required = min_weeks,
            "not enough history for baseline"
        );
        return Err(WellnessError::InsufficientData {
            category,
            observed: weekly_means.len(),
            required: min_weeks,
        });
    }

    let count = weekly_means.len() as f64;
    let mean = weekly_means.iter().sum::<f64>() / count;
    let variance = weekly_means
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / count;

    Ok(Baseline {
        category,
        window_start,
        window_end,
        mean,
        stddev: variance.sqrt(),
        sample_count: weekly_means.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + Duration::days(offset)
    }

    fn week_of(category: Category, week_start: NaiveDate, value: f64) -> Vec<MetricSample> {
        (0..DAYS_PER_WEEK)
            .map(|offset| MetricSample {
                date: week_start + Duration::days(offset),
                category,
                raw_value: value,
            })
            .collect()
    }

    #[test]
    fn weekly_aggregate_averages_the_week_only() {
        let mut samples = week_of(Category::Sleep, day(0), 6.0);
        samples.extend(week_of(Category::Sleep, day(7), 8.0));
        samples.push(MetricSample {
            date: day(3),
            category: Category::Exercise,
            raw_value: 90.0,
        });

        let aggregate = weekly_aggregate(Category::Sleep, &samples, day(7)).unwrap().unwrap();
        assert_eq!(aggregate.mean_value, 8.0);
        assert_eq!(aggregate.week_start, day(7));
        assert_eq!(aggregate.week_end, day(13));
        assert!(weekly_aggregate(Category::Nutrition, &samples, day(7)).unwrap().is_none());
    }

    #[test]
    fn baseline_uses_population_stddev_of_weekly_means() {
        let current = day(28);
        let mut samples = Vec::new();
        for (week, value) in [7.0, 8.0, 7.0, 8.0].into_iter().enumerate() {
            samples.extend(week_of(Category::Sleep, day(week as i64 * 7), value));
        }

        let baseline = build_baseline(Category::Sleep, &samples, current, 28, 2).unwrap();
        assert!((baseline.mean - 7.5).abs() < 1e-9);
        assert!((baseline.stddev - 0.5).abs() < 1e-9);
        assert_eq!(baseline.sample_count, 4);
        assert_eq!(baseline.window_start, day(0));
        assert_eq!(baseline.window_end, day(27));
    }

    #[test]
    fn sparse_days_do_not_outweigh_dense_weeks() {
        let current = day(14);
        let mut samples = week_of(Category::Exercise, day(0), 10.0);
        samples.push(MetricSample {
            date: day(10),
            category: Category::Exercise,
            raw_value: 50.0,
        });

        let baseline = build_baseline(Category::Exercise, &samples, current, 14, 2).unwrap();
        assert!((baseline.mean - 30.0).abs() < 1e-9);
    }

    #[test]
    fn current_week_never_contaminates_baseline() {
        for window_days in [7, 10, 14, 21, 28, 35] {
            let current = day(35);
            let mut samples = Vec::new();
            for week in 0..5 {
                samples.extend(week_of(Category::Recovery, day(week * 7), 50.0));
            }
            samples.extend(week_of(Category::Recovery, current, 1_000.0));
            samples.extend(week_of(Category::Recovery, current + Duration::days(7), 1_000.0));

            let baseline =
                build_baseline(Category::Recovery, &samples, current, window_days, 1).unwrap();
            assert_eq!(baseline.mean, 50.0, "window {window_days}");
            assert_eq!(baseline.stddev, 0.0);
            assert!(baseline.window_end < current);
        }
    }

    #[test]
    fn samples_older_than_window_are_ignored() {
        let current = day(35);
        let mut samples = week_of(Category::Nutrition, day(0), 100.0);
        samples.extend(week_of(Category::Nutrition, day(21), 5.0));
        samples.extend(week_of(Category::Nutrition, day(28), 7.0));

        let baseline = build_baseline(Category::Nutrition, &samples, current, 28, 2).unwrap();
        assert!((baseline.mean - 6.0).abs() < 1e-9);
        assert_eq!(baseline.sample_count, 2);
    }

    #[test]
    fn single_prior_week_is_insufficient() {
        let current = day(28);
        let samples = week_of(Category::Sleep, day(21), 7.0);

        let err = build_baseline(Category::Sleep, &samples, current, 28, 2).unwrap_err();
        assert_eq!(
            err,
            WellnessError::InsufficientData {
                category: Category::Sleep,
                observed: 1,
                required: 2,
            }
        );
    }

    #[test]
    fn calendar_edges_are_errors_not_panics() {
        let first = NaiveDate::MIN;
        assert_eq!(
            build_baseline(Category::Sleep, &[], first, 28, 2),
            Err(WellnessError::DateOutOfRange(first))
        );

        let last = NaiveDate::MAX;
        assert_eq!(
            weekly_aggregate(Category::Sleep, &[], last),
            Err(WellnessError::DateOutOfRange(last))
        );
    }
}
