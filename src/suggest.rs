//! Suggestion rule ladder. The last rung always matches.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::WellnessConfig;
use crate::models::{AnomalyRecord, Category, Direction, Suggestion};

pub const CAVEATS: &str = "For informational purposes only; not medical guidance.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    RecoveryDip,
    SleepDip,
    OffWeek,
    StrongWeek,
    SteadyWeek,
}

pub const LADDER: [Rule; 5] = [
    Rule::RecoveryDip,
    Rule::SleepDip,
    Rule::OffWeek,
    Rule::StrongWeek,
    Rule::SteadyWeek,
];

#[derive(Debug, Clone, Copy)]
pub struct SuggestionInput<'a> {
    pub anomalies: &'a [AnomalyRecord],
    pub normalized: &'a BTreeMap<Category, f64>,
    pub wellness_score: f64,
}

fn guidance(category: Category) -> &'static str {
    match category {
        Category::Exercise => "Fit in short, easy movement sessions on most days.",
        Category::Sleep => {
            "Aim for consistent bed and wake times plus 30-60 extra minutes in bed."
        }
        Category::Nutrition => "Plan protein-forward meals and keep hydration steady.",
        Category::Recovery => "Schedule a lighter training block with gentle mobility work.",
    }
}

fn strongest_dip<'a>(
    anomalies: &'a [AnomalyRecord],
    matches: impl Fn(Category) -> bool,
) -> Option<&'a AnomalyRecord> {
    anomalies
        .iter()
        .filter(|a| a.direction == Direction::Lower && matches(a.metric))
        .max_by(|a, b| {
            a.z_score
                .abs()
                .partial_cmp(&b.z_score.abs())
                .unwrap_or(Ordering::Equal)
        })
}

fn lowest_metric(normalized: &BTreeMap<Category, f64>) -> Option<(Category, f64)> {
    normalized
        .iter()
        .map(|(category, score)| (*category, *score))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
}

impl Rule {
    pub fn evaluate(&self, config: &WellnessConfig, input: &SuggestionInput<'_>) -> Option<String> {
        match self {
            Rule::RecoveryDip => {
                strongest_dip(input.anomalies, |c| c.is_recovery_related()).map(|anomaly| {
                    format!(
                        "Your {} signal is running below its usual level (z-score {:.1}). \
                         Reduce training load this week and prioritize rest days. {}",
                        anomaly.metric,
                        anomaly.z_score,
                        guidance(anomaly.metric)
                    )
                })
            }
            Rule::SleepDip => {
                strongest_dip(input.anomalies, |c| c == Category::Sleep).map(|anomaly| {
                    format!(
                        "You slept less than usual this week ({:.1} vs your typical {:.1}). {}",
                        anomaly.value,
                        anomaly.baseline_mean,
                        guidance(Category::Sleep)
                    )
                })
            }
            Rule::OffWeek => {
                if input.wellness_score >= config.low_score_threshold {
                    return None;
                }
                Some(match lowest_metric(input.normalized) {
                    Some((category, score)) => format!(
                        "This week was a bit off. Your lowest area is {category} at {score:.1}/100. {}",
                        guidance(category)
                    ),
                    None => "This week was a bit off. Pick one small routine to rebuild next week."
                        .to_string(),
                })
            }
            Rule::StrongWeek => (input.wellness_score >= config.high_score_threshold).then(|| {
                format!(
                    "Great week with an overall score of {:.1}. Keep the routines that got you here.",
                    input.wellness_score
                )
            }),
            Rule::SteadyWeek => Some(steady_week_text()),
        }
    }
}

fn steady_week_text() -> String {
    "Steady week with no strong changes from your usual pattern. \
     Keep your current routines going."
        .to_string()
}

pub fn select(config: &WellnessConfig, input: &SuggestionInput<'_>) -> (Rule, String) {
    LADDER
        .iter()
        .find_map(|rule| rule.evaluate(config, input).map(|text| (*rule, text)))
        .unwrap_or_else(|| (Rule::SteadyWeek, steady_week_text()))
}

pub fn suggest(
    config: &WellnessConfig,
    anomalies: &[AnomalyRecord],
    normalized: &BTreeMap<Category, f64>,
    wellness_score: f64,
) -> Suggestion {
    let input = SuggestionInput {
        anomalies,
        normalized,
        wellness_score,
    };
    let (_, text) = select(config, &input);
    Suggestion {
        text,
        caveats: CAVEATS.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDICAL_TERMS: [&str; 9] = [
        "diagnos",
        "disease",
        "medical",
        "symptom",
        "treatment",
        "illness",
        "clinical",
        "doctor",
        "medication",
    ];

    fn dip(metric: Category, z_score: f64) -> AnomalyRecord {
        AnomalyRecord {
            metric,
            value: 5.0,
            baseline_mean: 7.5,
            z_score,
            direction: if z_score > 0.0 {
                Direction::Higher
            } else {
                Direction::Lower
            },
        }
    }

    fn rule_for(anomalies: &[AnomalyRecord], normalized: &BTreeMap<Category, f64>, score: f64) -> Rule {
        let config = WellnessConfig::default();
        let input = SuggestionInput {
            anomalies,
            normalized,
            wellness_score: score,
        };
        select(&config, &input).0
    }

    #[test]
    fn recovery_dip_outranks_sleep_dip() {
        let anomalies = vec![dip(Category::Sleep, -5.0), dip(Category::Recovery, -2.1)];
        assert_eq!(rule_for(&anomalies, &BTreeMap::new(), 20.0), Rule::RecoveryDip);
    }

    #[test]
    fn sleep_dip_fires_without_recovery_dip() {
        let anomalies = vec![dip(Category::Sleep, -5.0), dip(Category::Recovery, 2.4)];
        assert_eq!(rule_for(&anomalies, &BTreeMap::new(), 20.0), Rule::SleepDip);

        let text = suggest(&WellnessConfig::default(), &anomalies, &BTreeMap::new(), 20.0).text;
        assert!(text.contains("5.0 vs your typical 7.5"));
    }

    #[test]
    fn higher_sleep_is_not_a_dip() {
        let anomalies = vec![dip(Category::Sleep, 3.0)];
        assert_eq!(rule_for(&anomalies, &BTreeMap::new(), 60.0), Rule::SteadyWeek);
    }

    #[test]
    fn low_score_names_weakest_metric() {
        let normalized = BTreeMap::from([
            (Category::Exercise, 35.0),
            (Category::Sleep, 42.0),
            (Category::Nutrition, 12.5),
        ]);
        let anomalies = vec![dip(Category::Exercise, -2.2)];
        assert_eq!(rule_for(&anomalies, &normalized, 30.0), Rule::OffWeek);

        let suggestion = suggest(&WellnessConfig::default(), &anomalies, &normalized, 30.0);
        assert!(suggestion.text.contains("lowest area is nutrition at 12.5/100"));
    }

    #[test]
    fn score_thresholds_pick_positive_or_neutral() {
        let normalized = BTreeMap::from([(Category::Sleep, 80.0)]);
        assert_eq!(rule_for(&[], &normalized, 80.0), Rule::StrongWeek);
        assert_eq!(rule_for(&[], &normalized, 79.9), Rule::SteadyWeek);
        assert_eq!(rule_for(&[], &normalized, 40.0), Rule::SteadyWeek);
        assert_eq!(rule_for(&[], &normalized, 39.9), Rule::OffWeek);
    }

    #[test]
    fn ties_use_largest_deviation() {
        let config = WellnessConfig::default();
        let anomalies = vec![dip(Category::Recovery, -2.1), dip(Category::Recovery, -3.4)];
        let text = suggest(&config, &anomalies, &BTreeMap::new(), 50.0).text;
        assert!(text.contains("z-score -3.4"));
    }

    #[test]
    fn every_rung_yields_non_medical_text() {
        let config = WellnessConfig::default();
        let normalized = BTreeMap::from([(Category::Recovery, 10.0), (Category::Sleep, 55.0)]);
        let cases: Vec<(Vec<AnomalyRecord>, BTreeMap<Category, f64>, f64)> = vec![
            (vec![dip(Category::Recovery, -3.0)], normalized.clone(), 10.0),
            (vec![dip(Category::Sleep, -3.0)], normalized.clone(), 50.0),
            (vec![], normalized.clone(), 10.0),
            (vec![], BTreeMap::new(), 10.0),
            (vec![], normalized.clone(), 95.0),
            (vec![], normalized, 55.0),
        ];

        for (anomalies, normalized, score) in cases {
            let suggestion = suggest(&config, &anomalies, &normalized, score);
            assert!(!suggestion.text.trim().is_empty());
            let lowered = suggestion.text.to_lowercase();
            for term in MEDICAL_TERMS {
                assert!(!lowered.contains(term), "{term} in {}", suggestion.text);
            }
            assert_eq!(suggestion.caveats, CAVEATS);
        }
    }

    #[test]
    fn ladder_ends_with_the_catch_all_rung() {
        let config = WellnessConfig::default();
        let normalized = BTreeMap::new();
        let input = SuggestionInput {
            anomalies: &[],
            normalized: &normalized,
            wellness_score: 60.0,
        };
        assert_eq!(LADDER.last(), Some(&Rule::SteadyWeek));
        assert_eq!(
            select(&config, &input),
            (Rule::SteadyWeek, steady_week_text())
        );
    }
}
