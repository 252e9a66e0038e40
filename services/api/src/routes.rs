use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use leasehold::error::AppError;
use leasehold::workflows::leasing::{
    lease_router_with_actor_header, ActorId, AuditSource, AuditTrail, LeaseRepository,
    LeaseService,
};
use leasehold::workflows::portfolio::{ImportSummary, PortfolioImporter};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct PortfolioImportRequest {
    /// Raw CSV text of a portfolio spreadsheet export.
    pub(crate) csv: String,
    /// Actor recorded on the audit trail for each created draft.
    #[serde(default)]
    pub(crate) actor: Option<String>,
}

pub(crate) fn with_lease_routes<S>(
    service: Arc<LeaseService<S>>,
    actor_header: &str,
) -> axum::Router
where
    S: LeaseRepository + AuditTrail + 'static,
{
    lease_router_with_actor_header(service.clone(), actor_header)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/portfolio/import",
            axum::routing::post(portfolio_import_endpoint::<S>),
        )
        .layer(Extension(service))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn portfolio_import_endpoint<S>(
    Extension(service): Extension<Arc<LeaseService<S>>>,
    Json(payload): Json<PortfolioImportRequest>,
) -> Result<Json<ImportSummary>, AppError>
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let PortfolioImportRequest { csv, actor } = payload;

    let source = match actor {
        Some(actor) if !actor.trim().is_empty() => {
            AuditSource::actor(ActorId(actor.trim().to_string()))
        }
        _ => AuditSource::system(),
    };

    let reader = Cursor::new(csv.into_bytes());
    let summary = PortfolioImporter::from_reader(reader, &service, &source)?;
    Ok(Json(summary))
}
