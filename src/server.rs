use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::WellnessConfig;
use crate::error::WellnessError;
use crate::models::SummaryReport;
use crate::report;
use crate::source::SampleSource;

pub struct AppState {
    pub config: WellnessConfig,
    pub source: SampleSource,
}

#[derive(Debug, Deserialize)]
struct SummaryParams {
    week_start: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}

fn map_err(e: WellnessError) -> ApiError {
    match e {
        WellnessError::NoData => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        WellnessError::DateOutOfRange(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        _ => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn map_load_err(e: anyhow::Error) -> ApiError {
    match e.downcast::<WellnessError>() {
        Ok(err) => map_err(err),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "failed to load samples");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Data source not available.")
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryReport>, ApiError> {
    let (week_start, samples) = state
        .source
        .load_week(&state.config, params.week_start)
        .await
        .map_err(map_load_err)?;

    report::build_summary(&state.config, &samples, week_start)
        .map(Json)
        .map_err(|e| {
            warn!(%week_start, error = %e, "summary failed");
            map_err(e)
        })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/summary", get(summary))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "starting HTTP server");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl+c");
            }
        })
        .await?;

    info!("server stopped");
    Ok(())
}
