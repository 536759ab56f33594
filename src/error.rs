//! Error taxonomy of the analytics core.

use thiserror::Error;

use crate::models::Category;

#[derive(Debug, Error, PartialEq)]
pub enum WellnessError {
    /// A category name with no configuration behind it.
    #[error("unknown metric category: {0}")]
    UnknownCategory(String),

    /// Too little history to build a baseline. Recovered per category.
    #[error("insufficient history for {category}: {observed} weekly observations, need {required}")]
    InsufficientData {
        category: Category,
        observed: usize,
        required: usize,
    },

    /// Every category is missing for the evaluated week.
    #[error("no metric data available for the requested week")]
    NoData,

    /// Baseline history has zero variance. Recovered per category.
    #[error("baseline for {0} has zero variance")]
    DegenerateBaseline(Category),

    #[error("dates around {0} fall outside the supported calendar range")]
    DateOutOfRange(chrono::NaiveDate),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type WellnessResult<T> = Result<T, WellnessError>;
