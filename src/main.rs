use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod anomaly;
mod baseline;
mod config;
mod db;
mod error;
mod models;
mod normalize;
mod report;
mod score;
mod server;
mod source;
mod suggest;

use config::WellnessConfig;
use source::SampleSource;

#[derive(Parser)]
#[command(name = "wellness-summary")]
#[command(about = "Weekly wellness summary from daily health metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Read samples from a `date,category,value` CSV instead of Postgres
    #[arg(long)]
    csv: Option<PathBuf>,
    /// TOML file overriding reference ranges, weights and thresholds
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load five weeks of realistic sample data
    Seed,
    /// Import samples from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the weekly summary as JSON
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        week_start: Option<NaiveDate>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        week_start: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Serve the summary over HTTP
    Serve {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

fn init_tracing() {
    let log_env = std::env::var("WELLNESS_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(format!("{log_env},sqlx=warn"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!(%log_env, "log filter");
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

impl SourceArgs {
    fn load_config(&self) -> anyhow::Result<WellnessConfig> {
        let config = match &self.config {
            Some(path) => WellnessConfig::load(path)?,
            None => WellnessConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    async fn open(&self) -> anyhow::Result<SampleSource> {
        match &self.csv {
            Some(path) => Ok(SampleSource::Csv(path.clone())),
            None => Ok(SampleSource::Postgres(connect().await?)),
        }
    }
}

async fn summarize(
    args: &SourceArgs,
    week_start: Option<NaiveDate>,
) -> anyhow::Result<models::SummaryReport> {
    let config = args.load_config()?;
    let source = args.open().await?;
    let (week_start, samples) = source.load_week(&config, week_start).await?;
    let summary = report::build_summary(&config, &samples, week_start)
        .with_context(|| format!("unable to summarize week starting {week_start}"))?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            let written = db::seed(&pool).await?;
            println!("Seeded {written} samples.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let written = db::import_csv(&pool, &csv).await?;
            println!("Imported {written} samples from {}.", csv.display());
        }
        Commands::Summary { source, week_start } => {
            let summary = summarize(&source, week_start).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Report {
            source,
            week_start,
            out,
        } => {
            let summary = summarize(&source, week_start).await?;
            std::fs::write(&out, report::render_markdown(&summary))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Serve { source, addr } => {
            let config = source.load_config()?;
            let state = Arc::new(server::AppState {
                config,
                source: source.open().await?,
            });
            server::serve(state, addr).await?;
        }
    }

    Ok(())
}
