use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::leave::LeaveStatus,
    models::session::Session,
    services::leave as leave_service,
    state::AppState,
};

/// The request payload for creating a leave request. The employee identity
/// comes from the session, never from the body.
#[derive(Deserialize)]
pub struct CreateLeaveRequest {
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// The query parameters for listing leave requests.
#[derive(Deserialize)]
pub struct ListRequestsQuery {
    #[serde(default)]
    pub employee_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<String>,
}

/// The request payload for approving/rejecting a request.
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub comments: Option<String>,
}

/// The request payload for creating a leave type.
#[derive(Deserialize)]
pub struct CreateLeaveTypeRequest {
    pub name: String,
    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,
    pub default_balance: f64,
    #[serde(default)]
    pub accrual_rate: f64,
}

fn default_requires_approval() -> bool {
    true
}

/// The query parameters for listing balances.
#[derive(Deserialize)]
pub struct ListBalancesQuery {
    #[serde(default)]
    pub employee_id: Option<Uuid>,
}

/// Creates a leave request for the acting employee.
#[axum::debug_handler]
pub async fn create_request(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateLeaveRequest>,
) -> Result<Response> {
    let request = leave_service::create_request(
        &state,
        &session,
        req.leave_type_id,
        req.start_date,
        req.end_date,
        &req.reason,
    )
    .await?;

    let body = sonic_rs::to_string(&request).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Lists leave requests, tenant- and role-scoped.
#[axum::debug_handler]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Response> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            LeaveStatus::from_str(s)
                .map_err(|_| AppError::Validation(format!("Unknown status filter: {}", s)))
        })
        .transpose()?;

    let requests =
        leave_service::list_requests(&state, &session, query.employee_id, status).await?;

    let body = sonic_rs::to_string(&sonic_rs::json!({
        "requests": requests,
        "count": requests.len(),
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Approves or rejects a pending request.
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Response> {
    let new_status = LeaveStatus::from_str(&req.status)
        .map_err(|_| AppError::Validation(format!("Unknown status: {}", req.status)))?;

    let request = leave_service::update_status(
        &state,
        &session,
        request_id,
        new_status,
        req.comments.as_deref(),
    )
    .await?;

    let body = sonic_rs::to_string(&request).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Cancels a pending request (owner or admin).
#[axum::debug_handler]
pub async fn cancel(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(request_id): Path<Uuid>,
) -> Result<Response> {
    let request = leave_service::cancel(&state, &session, request_id).await?;

    let body = sonic_rs::to_string(&request).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Lists the tenant's leave types.
#[axum::debug_handler]
pub async fn list_types(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let types = leave_service::list_types(&state, &session).await?;

    let body = sonic_rs::to_string(&types).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Creates a leave type (admin only).
#[axum::debug_handler]
pub async fn create_type(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateLeaveTypeRequest>,
) -> Result<Response> {
    let leave_type = leave_service::create_type(
        &state,
        &session,
        &req.name,
        req.requires_approval,
        req.default_balance,
        req.accrual_rate,
    )
    .await?;

    let body = sonic_rs::to_string(&leave_type).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Lists leave balances (own, or any employee for approvers).
#[axum::debug_handler]
pub async fn list_balances(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListBalancesQuery>,
) -> Result<Response> {
    let balances = leave_service::list_balances(&state, &session, query.employee_id).await?;

    let body = sonic_rs::to_string(&balances).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}
