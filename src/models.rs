use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::WellnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Exercise,
    Sleep,
    Nutrition,
    Recovery,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Exercise,
        Category::Sleep,
        Category::Nutrition,
        Category::Recovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Exercise => "exercise",
            Category::Sleep => "sleep",
            Category::Nutrition => "nutrition",
            Category::Recovery => "recovery",
        }
    }

    pub fn is_recovery_related(&self) -> bool {
        matches!(self, Category::Recovery)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = WellnessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exercise" => Ok(Category::Exercise),
            "sleep" => Ok(Category::Sleep),
            "nutrition" => Ok(Category::Nutrition),
            "recovery" => Ok(Category::Recovery),
            _ => Err(WellnessError::UnknownCategory(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub date: NaiveDate,
    pub category: Category,
    pub raw_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyAggregate {
    pub category: Category,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub mean_value: f64,
}

/// Historical reference for one category. `sample_count` is the number of
/// weekly observations the statistics were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub category: Category,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub mean: f64,
    pub stddev: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub metric: Category,
    pub value: f64,
    pub baseline_mean: f64,
    pub z_score: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedMetric {
    pub category: Category,
    pub score: f64,
}

/// Inclusive date range of the evaluated week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub text: String,
    pub caveats: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub week_range: WeekRange,
    pub normalized_metrics: BTreeMap<Category, f64>,
    pub anomalies: Vec<AnomalyRecord>,
    pub wellness_score: f64,
    pub suggestion: Suggestion,
}
