// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP API
 * Probe catalogue, suite execution, progress and report endpoints
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::cancel::CancelToken;
use crate::engine::SuiteRunner;
use crate::errors::SuiteError;
use crate::progress::ProgressTracker;
use crate::registry::{ProbeInfo, ProbeRegistry};
use crate::reporting::{ReportEngine, ReportFormat, ReportStore};
use crate::types::ProbeCategory;

/// Shared handler state, constructed once at startup
pub struct AppState {
    pub registry: Arc<ProbeRegistry>,
    pub tracker: Arc<ProgressTracker>,
    pub runner: Arc<SuiteRunner>,
    pub reports: Arc<ReportStore>,
    pub report_engine: ReportEngine,
    /// Cancels every in-flight suite on shutdown
    pub shutdown: CancelToken,
}

impl AppState {
    pub fn new(runner: SuiteRunner) -> Self {
        Self {
            registry: runner.registry().clone(),
            tracker: runner.tracker().clone(),
            runner: Arc::new(runner),
            reports: Arc::new(ReportStore::new()),
            report_engine: ReportEngine::new(),
            shutdown: CancelToken::new(),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<SuiteError> for ApiError {
    fn from(err: SuiteError) -> Self {
        let status = match &err {
            SuiteError::InvalidTarget { .. } => StatusCode::BAD_REQUEST,
            SuiteError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            SuiteError::Registry(_) | SuiteError::Tracker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    pub target_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
struct CategoryListing {
    category: ProbeCategory,
    display_name: String,
    probes: Vec<ProbeInfo>,
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_probes_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let categories: Vec<CategoryListing> = state
        .registry
        .categories()
        .into_iter()
        .map(|category| CategoryListing {
            display_name: category.display_name(),
            probes: state.registry.get_by_category(&category).infos(),
            category,
        })
        .collect();

    Json(json!({
        "total": state.registry.len(),
        "categories": categories,
    }))
}

async fn get_probe_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ProbeInfo>, ApiError> {
    state
        .registry
        .get(&name)
        .map(|d| Json(d.info()))
        .ok_or_else(|| ApiError::not_found(format!("Unknown probe '{}'", name)))
}

async fn run_suite_handler(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    payload: Result<Json<TestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let target = request
        .target_url
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("target_url is required"))?;

    let category = match category.to_lowercase().as_str() {
        "all" => None,
        label => Some(ProbeCategory::parse(label)),
    };

    info!("Suite requested: {} against {}", category.as_ref().map(|c| c.as_str()).unwrap_or("all"), target);
    let result = state
        .runner
        .run_with_cancel(&target, category.as_ref(), &state.shutdown)
        .await?;

    let report = state.report_engine.build(&result);
    let body = json!({
        "suite_id": result.suite_id,
        "report_id": report.report_id,
        "target": result.target,
        "category": result.category_label(),
        "status": result.status,
        "test_results": result.per_probe_status,
        "total_tests": result.total_probes,
        "total_vulnerabilities": result.total_findings(),
        "summary": report.summary,
        "recommendations": report.recommendations,
        "findings": result.findings,
        "duration_ms": result.duration_ms,
    });
    state.reports.insert(report);

    Ok(Json(body))
}

async fn progress_summary_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.tracker.summary())
}

async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .tracker
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No progress record '{}'", id)))
}

async fn list_reports_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let reports: Vec<_> = state
        .reports
        .all()
        .into_iter()
        .map(|r| {
            json!({
                "report_id": r.report_id,
                "suite_id": r.suite_id,
                "target": r.target,
                "category": r.category,
                "generated_at": r.generated_at,
                "total_vulnerabilities": r.summary.total,
            })
        })
        .collect();
    Json(reports)
}

async fn report_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        Some(label) => label.parse::<ReportFormat>().map_err(ApiError::bad_request)?,
        None => ReportFormat::Json,
    };
    let report = state
        .reports
        .get(&id)
        .ok_or_else(|| ApiError::not_found(format!("No report '{}'", id)))?;

    let output = state.report_engine.render(&report, format).map_err(|e| {
        error!("Report rendering failed: {:#}", e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "report rendering failed")
    })?;

    Ok(([(header::CONTENT_TYPE, output.mime_type)], output.data).into_response())
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/probes", get(list_probes_handler))
        .route("/probes/:name", get(get_probe_handler))
        .route("/test/:category", post(run_suite_handler))
        .route("/progress", get(progress_summary_handler))
        .route("/progress/:id", get(progress_handler))
        .route("/reports", get(list_reports_handler))
        .route("/reports/:id", get(report_handler))
        .with_state(state)
}

/// Serve until `shutdown` resolves, then cancel running suites
pub async fn serve<F>(state: Arc<AppState>, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    let cancel = state.shutdown.clone();
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            cancel.cancel();
        })
        .await?;
    Ok(())
}
