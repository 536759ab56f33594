use chrono::{Duration, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Category, MetricSample};
use crate::source;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_sample(pool: &PgPool, sample: &MetricSample) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO wellness.metric_samples (id, sample_date, category, raw_value)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (sample_date, category) DO UPDATE
        SET raw_value = EXCLUDED.raw_value, recorded_at = now()
        WHERE wellness.metric_samples.raw_value IS DISTINCT FROM EXCLUDED.raw_value
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(sample.date)
    .bind(sample.category.as_str())
    .bind(sample.raw_value)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Deterministic value for `day` days back, wobbling around `center`.
fn seed_value(center: f64, spread: f64, day: i64) -> f64 {
    let wobble = ((day * 37 % 11) as f64 - 5.0) / 5.0;
    ((center + spread * wobble) * 10.0).round() / 10.0
}

/// Five weeks of daily samples ending today.
pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let today = Utc::now().date_naive();
    let profiles = [
        (Category::Exercise, 35.0, 12.0),
        (Category::Sleep, 7.2, 0.6),
        (Category::Nutrition, 6.0, 1.0),
        (Category::Recovery, 55.0, 8.0),
    ];

    let mut written = 0usize;
    for day in 0..35 {
        let date = today - Duration::days(day);
        for (category, center, spread) in profiles {
            let sample = MetricSample {
                date,
                category,
                raw_value: seed_value(center, spread, day),
            };
            if upsert_sample(pool, &sample).await? {
                written += 1;
            }
        }
    }

    Ok(written)
}

pub async fn latest_sample_date(pool: &PgPool) -> anyhow::Result<Option<NaiveDate>> {
    let row = sqlx::query("SELECT max(sample_date) AS latest FROM wellness.metric_samples")
        .fetch_one(pool)
        .await?;
    Ok(row.get("latest"))
}

pub async fn fetch_samples(
    pool: &PgPool,
    since_date: NaiveDate,
    until_date: NaiveDate,
) -> anyhow::Result<Vec<MetricSample>> {
    let rows = sqlx::query(
        "SELECT sample_date, category, raw_value \
         FROM wellness.metric_samples \
         WHERE sample_date >= $1 AND sample_date <= $2 \
         ORDER BY sample_date",
    )
    .bind(since_date)
    .bind(until_date)
    .fetch_all(pool)
    .await?;

    let mut samples = Vec::with_capacity(rows.len());
    for row in rows {
        let category: String = row.get("category");
        samples.push(MetricSample {
            date: row.get("sample_date"),
            category: category.parse()?,
            raw_value: row.get("raw_value"),
        });
    }

    Ok(samples)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let samples = source::read_csv(csv_path)?;
    let mut written = 0usize;

    for sample in samples.iter() {
        if upsert_sample(pool, sample).await? {
            written += 1;
        }
    }

    Ok(written)
}
