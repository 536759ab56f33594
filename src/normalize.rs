use crate::config::WellnessConfig;
use crate::error::WellnessResult;
use crate::models::{Category, NormalizedMetric, WeeklyAggregate};

/// Maps a weekly mean onto 0-100 using the category's reference range.
pub fn normalize(config: &WellnessConfig, category: Category, mean_value: f64) -> WellnessResult<f64> {
    let range = config.range(category)?;
    let scaled = 100.0 * (mean_value - range.low) / (range.high - range.low);
    if scaled.is_nan() {
        return Ok(0.0);
    }
    Ok(scaled.clamp(0.0, 100.0))
}

pub fn normalize_aggregate(
    config: &WellnessConfig,
    aggregate: &WeeklyAggregate,
) -> WellnessResult<NormalizedMetric> {
    Ok(NormalizedMetric {
        category: aggregate.category,
        score: normalize(config, aggregate.category, aggregate.mean_value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WellnessError;

    #[test]
    fn midpoint_maps_to_fifty() {
        let config = WellnessConfig::default();
        let score = normalize(&config, Category::Sleep, 6.5).unwrap();
        assert!((score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_values_are_clamped() {
        let config = WellnessConfig::default();
        for value in [-1.0e12, -5.0, 0.0, 3.9, 9.1, 1.0e12, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            for category in Category::ALL {
                let score = normalize(&config, category, value).unwrap();
                assert!((0.0..=100.0).contains(&score), "{category} {value} -> {score}");
            }
        }
        assert_eq!(normalize(&config, Category::Sleep, 12.0).unwrap(), 100.0);
        assert_eq!(normalize(&config, Category::Sleep, 2.0).unwrap(), 0.0);
    }

    #[test]
    fn missing_range_is_unknown_category() {
        let mut config = WellnessConfig::default();
        config.ranges.remove(&Category::Nutrition);
        assert_eq!(
            normalize(&config, Category::Nutrition, 5.0),
            Err(WellnessError::UnknownCategory("nutrition".to_string()))
        );
    }
}
