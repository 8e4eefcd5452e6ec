use axum::{
    extract::{Path, State},
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
    models::session::{Role, Session},
    repositories::employee::EmployeeUpdate,
    services::employees as employee_service,
    state::AppState,
};

/// The request payload for creating an employee.
#[derive(Deserialize)]
pub struct CreateEmployeeRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

fn default_role() -> String {
    "employee".to_string()
}

/// The request payload for updating an employee. Absent fields are left
/// untouched.
#[derive(Deserialize)]
pub struct UpdateEmployeeRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

fn parse_role(role: &str) -> Result<Role> {
    Role::from_str(role).map_err(|_| AppError::Validation(format!("Unknown role: {}", role)))
}

/// Creates an employee (admin only).
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<Response> {
    let employee = employee_service::create(
        &state,
        &session,
        employee_service::CreateEmployee {
            first_name: &req.first_name,
            last_name: &req.last_name,
            email: &req.email,
            password: &req.password,
            role: parse_role(&req.role)?,
            position: req.position.as_deref(),
            department: req.department.as_deref(),
            hire_date: req.hire_date,
        },
    )
    .await?;

    let body = sonic_rs::to_string(&employee).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Lists the tenant's employees.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let employees = employee_service::list(&state, &session).await?;

    let body = sonic_rs::to_string(&sonic_rs::json!({
        "employees": employees,
        "count": employees.len(),
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Fetches one employee.
#[axum::debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(employee_id): Path<Uuid>,
) -> Result<Response> {
    let employee = employee_service::get(&state, &session, employee_id).await?;

    let body = sonic_rs::to_string(&employee).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Updates an employee (admin only).
#[axum::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(employee_id): Path<Uuid>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> Result<Response> {
    let role = req.role.as_deref().map(parse_role).transpose()?;

    let employee = employee_service::update(
        &state,
        &session,
        employee_id,
        &EmployeeUpdate {
            first_name: req.first_name.as_deref(),
            last_name: req.last_name.as_deref(),
            role,
            position: req.position.as_deref(),
            department: req.department.as_deref(),
            hire_date: req.hire_date,
        },
    )
    .await?;

    let body = sonic_rs::to_string(&employee).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Deactivates an employee (admin only).
#[axum::debug_handler]
pub async fn deactivate(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(employee_id): Path<Uuid>,
) -> Result<Response> {
    employee_service::deactivate(&state, &session, employee_id).await?;
    Ok((StatusCode::OK, r#"{"message":"Employee deactivated"}"#).into_response())
}
