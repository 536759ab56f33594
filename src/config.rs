use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{WellnessError, WellnessResult};
use crate::models::Category;

const WEIGHT_TOLERANCE: f64 = 1e-6;
const MAX_WINDOW_DAYS: i64 = 3650;

/// Reference range mapping a weekly mean onto the 0-100 axis. `low` scores 0,
/// `high` scores 100.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: f64,
}

/// Immutable tuning for the whole pipeline. Built once at startup and shared
/// read-only with every report computation.
#[derive(Debug, Clone, PartialEq)]
pub struct WellnessConfig {
    pub ranges: BTreeMap<Category, ReferenceRange>,
    pub weights: BTreeMap<Category, f64>,
    pub z_threshold: f64,
    pub window_days: i64,
    pub min_baseline_weeks: usize,
    pub low_score_threshold: f64,
    pub high_score_threshold: f64,
}

impl Default for WellnessConfig {
    fn default() -> Self {
        Self {
            ranges: BTreeMap::from([
                // active minutes per day
                (Category::Exercise, ReferenceRange { low: 0.0, high: 60.0 }),
                // hours per night
                (Category::Sleep, ReferenceRange { low: 4.0, high: 9.0 }),
                // diet quality rating, 0-10
                (Category::Nutrition, ReferenceRange { low: 2.0, high: 9.0 }),
                // overnight HRV in ms
                (Category::Recovery, ReferenceRange { low: 20.0, high: 80.0 }),
            ]),
            weights: BTreeMap::from([
                (Category::Exercise, 0.3),
                (Category::Sleep, 0.3),
                (Category::Nutrition, 0.2),
                (Category::Recovery, 0.2),
            ]),
            z_threshold: 2.0,
            window_days: 28,
            min_baseline_weeks: 2,
            low_score_threshold: 40.0,
            high_score_threshold: 80.0,
        }
    }
}

/// On-disk shape. Category keys stay strings here so that a typo surfaces as
/// `UnknownCategory` rather than a generic parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    ranges: HashMap<String, ReferenceRange>,
    #[serde(default)]
    weights: HashMap<String, f64>,
    z_threshold: Option<f64>,
    window_days: Option<i64>,
    min_baseline_weeks: Option<usize>,
    low_score_threshold: Option<f64>,
    high_score_threshold: Option<f64>,
}

impl WellnessConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Values absent from the file keep their defaults. When `weights` is
    /// given it replaces the default table as a whole.
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        let mut config = Self::default();

        for (name, range) in file.ranges {
            config.ranges.insert(name.parse()?, range);
        }
        if !file.weights.is_empty() {
            let mut weights = BTreeMap::new();
            for (name, weight) in file.weights {
                weights.insert(name.parse()?, weight);
            }
            config.weights = weights;
        }
        if let Some(value) = file.z_threshold {
            config.z_threshold = value;
        }
        if let Some(value) = file.window_days {
            config.window_days = value;
        }
        if let Some(value) = file.min_baseline_weeks {
            config.min_baseline_weeks = value;
        }
        if let Some(value) = file.low_score_threshold {
            config.low_score_threshold = value;
        }
        if let Some(value) = file.high_score_threshold {
            config.high_score_threshold = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WellnessResult<()> {
        for category in Category::ALL {
            let range = self.range(category)?;
            if !self.weights.contains_key(&category) {
                return Err(WellnessError::InvalidConfig(format!(
                    "missing weight for {category}"
                )));
            }
            if !(range.low.is_finite() && range.high.is_finite()) || range.low >= range.high {
                return Err(WellnessError::InvalidConfig(format!(
                    "range for {category} must satisfy low < high (got {} .. {})",
                    range.low, range.high
                )));
            }
        }

        if let Some((category, weight)) = self
            .weights
            .iter()
            .find(|(_, w)| w.is_nan() || **w <= 0.0)
        {
            return Err(WellnessError::InvalidConfig(format!(
                "weight for {category} must be positive (got {weight})"
            )));
        }
        let total: f64 = self.weights.values().sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(WellnessError::InvalidConfig(format!(
                "weights must sum to 1.0 (got {total})"
            )));
        }

        if self.z_threshold.is_nan() || self.z_threshold <= 0.0 {
            return Err(WellnessError::InvalidConfig(
                "z_threshold must be positive".to_string(),
            ));
        }
        if self.window_days < 7 {
            return Err(WellnessError::InvalidConfig(
                "window_days must cover at least one week".to_string(),
            ));
        }
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(WellnessError::InvalidConfig(format!(
                "window_days must not exceed {MAX_WINDOW_DAYS}"
            )));
        }
        if self.min_baseline_weeks == 0 {
            return Err(WellnessError::InvalidConfig(
                "min_baseline_weeks must be at least 1".to_string(),
            ));
        }
        if self.low_score_threshold > self.high_score_threshold {
            return Err(WellnessError::InvalidConfig(
                "low_score_threshold must not exceed high_score_threshold".to_string(),
            ));
        }

        Ok(())
    }

    pub fn range(&self, category: Category) -> WellnessResult<ReferenceRange> {
        self.ranges
            .get(&category)
            .copied()
            .ok_or_else(|| WellnessError::UnknownCategory(category.to_string()))
    }
}
