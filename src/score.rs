use std::collections::BTreeMap;

use crate::config::WellnessConfig;
use crate::error::{WellnessError, WellnessResult};
use crate::models::Category;

/// Weights of the categories present this week, rescaled to sum to 1.0.
/// Absent categories hand their share to the others in proportion.
pub fn rescaled_weights(
    config: &WellnessConfig,
    normalized: &BTreeMap<Category, f64>,
) -> WellnessResult<BTreeMap<Category, f64>> {
    let present: BTreeMap<Category, f64> = normalized
        .keys()
        .filter_map(|category| config.weights.get(category).map(|w| (*category, *w)))
        .collect();

    let total: f64 = present.values().sum();
    if present.is_empty() || total <= 0.0 {
        return Err(WellnessError::NoData);
    }

    Ok(present
        .into_iter()
        .map(|(category, weight)| (category, weight / total))
        .collect())
}

pub fn aggregate(
    config: &WellnessConfig,
    normalized: &BTreeMap<Category, f64>,
) -> WellnessResult<f64> {
    let weights = rescaled_weights(config, normalized)?;
    let score: f64 = weights
        .iter()
        .map(|(category, weight)| weight * normalized[category])
        .sum();
    Ok(score.clamp(0.0, 100.0))
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
