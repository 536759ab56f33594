use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::config::WellnessConfig;
use crate::db;
use crate::models::{Category, MetricSample};
use crate::report;

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    date: NaiveDate,
    category: String,
    value: f64,
}

pub fn read_csv(csv_path: &Path) -> anyhow::Result<Vec<MetricSample>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut samples = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result
            .with_context(|| format!("malformed row {} in {}", index + 1, csv_path.display()))?;
        let category: Category = row
            .category
            .parse()
            .with_context(|| format!("row {} in {}", index + 1, csv_path.display()))?;
        samples.push(MetricSample {
            date: row.date,
            category,
            raw_value: row.value,
        });
    }

    Ok(samples)
}

#[derive(Debug, Clone)]
pub enum SampleSource {
    Csv(PathBuf),
    Postgres(PgPool),
}

async fn read_csv_blocking(path: PathBuf) -> anyhow::Result<Vec<MetricSample>> {
    tokio::task::spawn_blocking(move || read_csv(&path)).await?
}

impl SampleSource {
    /// Resolves the target week and loads the baseline window plus the week itself.
    pub async fn load_week(
        &self,
        config: &WellnessConfig,
        week_start: Option<NaiveDate>,
    ) -> anyhow::Result<(NaiveDate, Vec<MetricSample>)> {
        if let Some(start) = week_start {
            report::read_window(config, start)?;
        }
        let today = Utc::now().date_naive();

        match self {
            SampleSource::Csv(path) => {
                let samples = read_csv_blocking(path.clone()).await?;
                let week_start = match week_start {
                    Some(start) => start,
                    None => report::default_week_start(samples.iter().map(|s| s.date).max(), today)?,
                };
                let (since, until) = report::read_window(config, week_start)?;
                let samples: Vec<MetricSample> = samples
                    .into_iter()
                    .filter(|s| s.date >= since && s.date <= until)
                    .collect();
                Ok((week_start, samples))
            }
            SampleSource::Postgres(pool) => {
                let week_start = match week_start {
                    Some(start) => start,
                    None => report::default_week_start(db::latest_sample_date(pool).await?, today)?,
                };
                let (since, until) = report::read_window(config, week_start)?;
                let samples = db::fetch_samples(pool, since, until).await?;
                Ok((week_start, samples))
            }
        }
    }
}
