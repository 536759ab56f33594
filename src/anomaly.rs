use std::cmp::Ordering;

use crate::error::{WellnessError, WellnessResult};
use crate::models::{AnomalyRecord, Baseline, Category, Direction};

/// z-score of `current_value` against the baseline. A baseline without
/// variance has no defined z-score.
pub fn z_score(current_value: f64, baseline: &Baseline) -> WellnessResult<f64> {
    if !baseline.stddev.is_finite() || baseline.stddev <= f64::EPSILON {
        return Err(WellnessError::DegenerateBaseline(baseline.category));
    }
    Ok((current_value - baseline.mean) / baseline.stddev)
}

pub fn detect(
    category: Category,
    current_value: f64,
    baseline: &Baseline,
    threshold: f64,
) -> Option<AnomalyRecord> {
    let z = z_score(current_value, baseline).ok()?;
    if !z.is_finite() || z.abs() < threshold {
        return None;
    }

    Some(AnomalyRecord {
        metric: category,
        value: current_value,
        baseline_mean: baseline.mean,
        z_score: z,
        direction: if z > 0.0 {
            Direction::Higher
        } else {
            Direction::Lower
        },
    })
}

/// Most significant deviation first; equal magnitudes fall back to category name.
pub fn sort_by_significance(anomalies: &mut [AnomalyRecord]) {
    anomalies.sort_by(|a, b| {
        b.z_score
            .abs()
            .partial_cmp(&a.z_score.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.metric.as_str().cmp(b.metric.as_str()))
    });
}
