use crate::workflows::leasing::audit::{AuditAction, AuditFilter, AuditSource, AuditTrail};
use crate::workflows::leasing::billing::ObligationError;
use crate::workflows::leasing::domain::{
    ActorId, CurrencyCode, EscalationStep, LeaseDraft, LeaseId, LeasePatch, Money, RevenueFigures,
};
use crate::workflows::leasing::repository::{LeaseRepository, RepositoryError};
use crate::workflows::leasing::service::{LeaseService, LeaseServiceError};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const DEFAULT_ACTOR_HEADER: &str = "x-actor-id";

const DEFAULT_RECENT_LIMIT: usize = 50;

pub struct RouterState<S> {
    service: Arc<LeaseService<S>>,
    actor_header: String,
}

impl<S> RouterState<S> {
    pub(crate) fn new(service: Arc<LeaseService<S>>, actor_header: &str) -> Arc<Self> {
        Arc::new(Self {
            service,
            actor_header: actor_header.to_ascii_lowercase(),
        })
    }
}

pub fn lease_router<S>(service: Arc<LeaseService<S>>) -> Router
where
    S: LeaseRepository + AuditTrail + 'static,
{
    lease_router_with_actor_header(service, DEFAULT_ACTOR_HEADER)
}

/// Routes for the lease workflow. The actor header names who performs each
/// operation; requests without it are attributed to the system actor.
pub fn lease_router_with_actor_header<S>(
    service: Arc<LeaseService<S>>,
    actor_header: &str,
) -> Router
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let state = RouterState::new(service, actor_header);

    Router::new()
        .route("/api/v1/leases", post(create_lease))
        .route(
            "/api/v1/leases/:lease_id",
            get(get_lease).patch(update_lease),
        )
        .route("/api/v1/leases/:lease_id/submit", post(submit_lease))
        .route("/api/v1/leases/:lease_id/approve", post(approve_lease))
        .route("/api/v1/leases/:lease_id/reject", post(reject_lease))
        .route("/api/v1/leases/:lease_id/reopen", post(reopen_lease))
        .route("/api/v1/leases/:lease_id/terminate", post(terminate_lease))
        .route("/api/v1/leases/:lease_id/renew", post(renew_lease))
        .route(
            "/api/v1/leases/:lease_id/escalations",
            post(amend_escalations),
        )
        .route("/api/v1/leases/:lease_id/obligation", get(lease_obligation))
        .route("/api/v1/leases/:lease_id/invoice", get(lease_invoice))
        .route("/api/v1/leases/:lease_id/audit", get(lease_audit))
        .route("/api/v1/audit/recent", get(recent_audit))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApproveRequest {
    notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RejectRequest {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    comments: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TerminateRequest {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RenewRequest {
    term_start: NaiveDate,
    term_end: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AmendEscalationsRequest {
    steps: Vec<EscalationStep>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObligationQuery {
    as_of: NaiveDate,
    net_sales: Option<Decimal>,
    gross_sales: Option<Decimal>,
    #[serde(default)]
    floor_only: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ObligationResponse {
    lease_id: LeaseId,
    as_of: NaiveDate,
    amount: Money,
    currency: CurrencyCode,
    floor_only: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InvoiceQuery {
    year: i32,
    month: u32,
    net_sales: Option<Decimal>,
    gross_sales: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InvoiceResponse {
    lease_id: LeaseId,
    year: i32,
    month: u32,
    amount: Money,
    currency: CurrencyCode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecentAuditQuery {
    limit: Option<usize>,
    lease_id: Option<String>,
    action: Option<AuditAction>,
}

pub(crate) async fn create_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    headers: HeaderMap,
    Json(draft): Json<LeaseDraft>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    match state.service.create_draft(draft, &source) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    match state.service.get(&LeaseId(lease_id)) {
        Ok(record) => Json(record).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<LeasePatch>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    match state.service.update(&LeaseId(lease_id), patch, &source) {
        Ok(record) => Json(record).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    match state.service.submit_for_review(&LeaseId(lease_id), &source) {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ApproveRequest>>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    let Json(request) = body.unwrap_or_default();
    match state
        .service
        .approve(&LeaseId(lease_id), request.notes, &source)
    {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<RejectRequest>>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    let Json(request) = body.unwrap_or_default();
    match state.service.reject(
        &LeaseId(lease_id),
        &request.reason,
        request.comments,
        &source,
    ) {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reopen_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    match state.service.reopen(&LeaseId(lease_id), &source) {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn terminate_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<TerminateRequest>>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    let Json(request) = body.unwrap_or_default();
    match state
        .service
        .terminate(&LeaseId(lease_id), request.reason, &source)
    {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn renew_lease<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RenewRequest>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    match state.service.renew(
        &LeaseId(lease_id),
        request.term_start,
        request.term_end,
        &source,
    ) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn amend_escalations<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AmendEscalationsRequest>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let source = audit_source(&state, &headers);
    match state
        .service
        .amend_escalations(&LeaseId(lease_id), request.steps, &source)
    {
        Ok(record) => Json(record).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn lease_obligation<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    Query(query): Query<ObligationQuery>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let lease_id = LeaseId(lease_id);
    let record = match state.service.get(&lease_id) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    let revenue = RevenueFigures {
        net_sales: query.net_sales.map(Money),
        gross_sales: query.gross_sales.map(Money),
    };
    let revenue = (!revenue.is_empty()).then_some(revenue);

    let result = if query.floor_only {
        state.service.guaranteed_floor(&lease_id, query.as_of)
    } else {
        state
            .service
            .obligation(&lease_id, query.as_of, revenue.as_ref())
    };

    match result {
        Ok(amount) => Json(ObligationResponse {
            lease_id,
            as_of: query.as_of,
            amount,
            currency: record.currency,
            floor_only: query.floor_only,
        })
        .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn lease_invoice<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
    Query(query): Query<InvoiceQuery>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let lease_id = LeaseId(lease_id);
    let record = match state.service.get(&lease_id) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    let revenue = RevenueFigures {
        net_sales: query.net_sales.map(Money),
        gross_sales: query.gross_sales.map(Money),
    };
    let revenue = (!revenue.is_empty()).then_some(revenue);

    match state
        .service
        .invoice_for_month(&lease_id, query.year, query.month, revenue.as_ref())
    {
        Ok(amount) => Json(InvoiceResponse {
            lease_id,
            year: query.year,
            month: query.month,
            amount,
            currency: record.currency,
        })
        .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn lease_audit<S>(
    State(state): State<Arc<RouterState<S>>>,
    Path(lease_id): Path<String>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    match state.service.audit_trail(&LeaseId(lease_id)) {
        Ok(entries) => Json(entries).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recent_audit<S>(
    State(state): State<Arc<RouterState<S>>>,
    Query(query): Query<RecentAuditQuery>,
) -> Response
where
    S: LeaseRepository + AuditTrail + 'static,
{
    let filter = AuditFilter {
        lease_id: query.lease_id.map(LeaseId),
        action: query.action,
    };
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    match state.service.recent_activity(limit, &filter) {
        Ok(entries) => Json(entries).into_response(),
        Err(error) => error_response(error),
    }
}

fn audit_source<S>(state: &RouterState<S>, headers: &HeaderMap) -> AuditSource {
    let actor = headers
        .get(&state.actor_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| ActorId(value.to_string()));
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    AuditSource {
        actor: actor.unwrap_or_else(ActorId::system),
        ip_address,
    }
}

fn error_response(error: LeaseServiceError) -> Response {
    let status = match &error {
        LeaseServiceError::Validation(failure) => {
            let violations: Vec<String> = failure
                .violations
                .iter()
                .map(|violation| violation.to_string())
                .collect();
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": error.to_string(), "violations": violations })),
            )
                .into_response();
        }
        LeaseServiceError::Obligation(ObligationError::AmbiguousSchedule(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        LeaseServiceError::Obligation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeaseServiceError::Transition(_)
        | LeaseServiceError::ImmutableState { .. }
        | LeaseServiceError::ConcurrentModification { .. } => StatusCode::CONFLICT,
        LeaseServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        LeaseServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        LeaseServiceError::Repository(_) | LeaseServiceError::Audit(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
