use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::anomaly;
use crate::baseline::{self, DAYS_PER_WEEK};
use crate::config::WellnessConfig;
use crate::error::WellnessResult;
use crate::models::{Category, Direction, MetricSample, SummaryReport, WeekRange};
use crate::normalize;
use crate::score;
use crate::suggest;

/// The seven days ending on the latest logged day, or ending today.
pub fn default_week_start(
    latest_sample: Option<NaiveDate>,
    today: NaiveDate,
) -> WellnessResult<NaiveDate> {
    baseline::shift_days(latest_sample.unwrap_or(today), 1 - DAYS_PER_WEEK)
}

/// Inclusive `(history start, week end)` read for the week at `week_start`.
pub fn read_window(
    config: &WellnessConfig,
    week_start: NaiveDate,
) -> WellnessResult<(NaiveDate, NaiveDate)> {
    baseline::shift_days(week_start, DAYS_PER_WEEK)?;
    Ok((
        baseline::shift_days(week_start, -config.window_days)?,
        baseline::shift_days(week_start, DAYS_PER_WEEK - 1)?,
    ))
}

pub fn build_summary(
    config: &WellnessConfig,
    samples: &[MetricSample],
    week_start: NaiveDate,
) -> WellnessResult<SummaryReport> {
    let (_, week_end) = read_window(config, week_start)?;
    let mut normalized_metrics = BTreeMap::new();
    let mut anomalies = Vec::new();

    for category in Category::ALL {
        let Some(aggregate) = baseline::weekly_aggregate(category, samples, week_start)? else {
            debug!(%category, "no samples this week");
            continue;
        };

        match normalize::normalize_aggregate(config, &aggregate) {
            Ok(metric) => {
                normalized_metrics.insert(metric.category, metric.score);
            }
            Err(err) => {
                warn!(%category, error = %err, "skipping category");
                continue;
            }
        }

        match baseline::build_baseline(
            category,
            samples,
            week_start,
            config.window_days,
            config.min_baseline_weeks,
        ) {
            Ok(base) => {
                debug!(
                    %category,
                    window_start = %base.window_start,
                    window_end = %base.window_end,
                    weeks = base.sample_count,
                    mean = base.mean,
                    stddev = base.stddev,
                    current = aggregate.mean_value,
                    week_end = %aggregate.week_end,
                    "baseline ready"
                );
                if let Some(record) =
                    anomaly::detect(category, aggregate.mean_value, &base, config.z_threshold)
                {
                    anomalies.push(record);
                }
            }
            Err(err) => debug!(%category, reason = %err, "anomaly check skipped"),
        }
    }

    anomaly::sort_by_significance(&mut anomalies);
    let wellness_score = score::round_one_decimal(score::aggregate(config, &normalized_metrics)?);
    let suggestion = suggest::suggest(config, &anomalies, &normalized_metrics, wellness_score);

    info!(
        %week_start,
        wellness_score,
        categories = normalized_metrics.len(),
        anomalies = anomalies.len(),
        "summary built"
    );

    Ok(SummaryReport {
        week_range: WeekRange {
            start: week_start,
            end: week_end,
        },
        normalized_metrics,
        anomalies,
        wellness_score,
        suggestion,
    })
}

pub fn render_markdown(report: &SummaryReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Weekly Wellness Summary");
    let _ = writeln!(
        output,
        "Week of {} to {}",
        report.week_range.start, report.week_range.end
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Wellness score: **{:.1}/100**", report.wellness_score);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Metrics");

    for category in Category::ALL {
        match report.normalized_metrics.get(&category) {
            Some(score) => {
                let _ = writeln!(output, "- {}: {:.1}/100", category, score);
            }
            None => {
                let _ = writeln!(output, "- {}: not logged this week", category);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Changes From Your Usual Pattern");

    if report.anomalies.is_empty() {
        let _ = writeln!(output, "No strong deviations this week.");
    } else {
        for anomaly in report.anomalies.iter() {
            let _ = writeln!(
                output,
                "- {} {} than usual: {:.1} vs {:.1} (z-score {:.1})",
                anomaly.metric,
                match anomaly.direction {
                    Direction::Higher => "higher",
                    Direction::Lower => "lower",
                },
                anomaly.value,
                anomaly.baseline_mean,
                anomaly.z_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Suggestion");
    let _ = writeln!(output, "{}", report.suggestion.text);
    let _ = writeln!(output);
    let _ = writeln!(output, "_{}_", report.suggestion.caveats);

    output
}
