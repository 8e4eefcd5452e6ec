use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::recruitment::{CandidateStage, PostingStatus},
    models::session::Session,
    services::recruitment as recruitment_service,
    state::AppState,
};

/// The request payload for creating or replacing a job posting.
#[derive(Deserialize)]
pub struct PostingRequest {
    pub title: String,
    pub description: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    #[serde(default = "default_posting_status")]
    pub status: String,
    pub closes_at: Option<DateTime<Utc>>,
}

fn default_posting_status() -> String {
    "draft".to_string()
}

/// The request payload for a public job application.
#[derive(Deserialize)]
pub struct ApplyRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
}

/// The request payload for moving a candidate through the pipeline.
#[derive(Deserialize)]
pub struct UpdateStageRequest {
    pub stage: String,
    pub notes: Option<String>,
}

impl PostingRequest {
    fn to_input(&self) -> Result<recruitment_service::PostingInput<'_>> {
        let status = PostingStatus::from_str(&self.status)
            .map_err(|_| AppError::Validation(format!("Unknown posting status: {}", self.status)))?;

        Ok(recruitment_service::PostingInput {
            title: &self.title,
            description: &self.description,
            department: self.department.as_deref(),
            location: self.location.as_deref(),
            employment_type: self.employment_type.as_deref(),
            status,
            closes_at: self.closes_at,
        })
    }
}

/// Creates a job posting (approver roles).
#[axum::debug_handler]
pub async fn create_posting(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<PostingRequest>,
) -> Result<Response> {
    let posting = recruitment_service::create_posting(&state, &session, &req.to_input()?).await?;

    let body = sonic_rs::to_string(&posting).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, body).into_response())
}

/// Lists the tenant's postings.
#[axum::debug_handler]
pub async fn list_postings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let postings = recruitment_service::list_postings(&state, &session).await?;

    let body = sonic_rs::to_string(&postings).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Fetches one posting of the tenant.
#[axum::debug_handler]
pub async fn get_posting(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(posting_id): Path<Uuid>,
) -> Result<Response> {
    let posting = recruitment_service::get_posting(&state, &session, posting_id).await?;

    let body = sonic_rs::to_string(&posting).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Replaces a posting's fields (approver roles).
#[axum::debug_handler]
pub async fn update_posting(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(posting_id): Path<Uuid>,
    Json(req): Json<PostingRequest>,
) -> Result<Response> {
    let posting =
        recruitment_service::update_posting(&state, &session, posting_id, &req.to_input()?).await?;

    let body = sonic_rs::to_string(&posting).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Lists a posting's candidates (approver roles).
#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(posting_id): Path<Uuid>,
) -> Result<Response> {
    let candidates = recruitment_service::list_candidates(&state, &session, posting_id).await?;

    let body = sonic_rs::to_string(&sonic_rs::json!({
        "candidates": candidates,
        "count": candidates.len(),
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Moves a candidate to a new stage (approver roles).
#[axum::debug_handler]
pub async fn update_candidate_stage(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(candidate_id): Path<Uuid>,
    Json(req): Json<UpdateStageRequest>,
) -> Result<Response> {
    let stage = CandidateStage::from_str(&req.stage)
        .map_err(|_| AppError::Validation(format!("Unknown stage: {}", req.stage)))?;

    let candidate = recruitment_service::update_candidate_stage(
        &state,
        &session,
        candidate_id,
        stage,
        req.notes.as_deref(),
    )
    .await?;

    let body = sonic_rs::to_string(&candidate).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

fn public_posting_json(p: &recruitment_service::PublicPosting) -> sonic_rs::Value {
    sonic_rs::json!({
        "id": p.posting.id.to_string(),
        "title": p.posting.title,
        "description": p.posting.description,
        "department": p.posting.department,
        "location": p.posting.location,
        "employment_type": p.posting.employment_type,
        "company": p.company,
        "closes_at": p.posting.closes_at.map(|t| t.to_rfc3339()),
        "posted_at": p.posting.created_at.to_rfc3339(),
    })
}

/// Lists open postings on the public root-domain job board. No session.
#[axum::debug_handler]
pub async fn list_public(State(state): State<AppState>) -> Result<Response> {
    let postings = recruitment_service::list_public_postings(&state).await?;

    let jobs: Vec<_> = postings.iter().map(public_posting_json).collect();
    let body = sonic_rs::to_string(&sonic_rs::json!({
        "jobs": jobs,
        "count": jobs.len(),
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Fetches one open posting for the public board. No session.
#[axum::debug_handler]
pub async fn get_public(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
) -> Result<Response> {
    let posting = recruitment_service::get_public_posting(&state, posting_id).await?;

    let body = sonic_rs::to_string(&public_posting_json(&posting))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}

/// Accepts a public application against an open posting. No session.
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Path(posting_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<Response> {
    let candidate = recruitment_service::apply(
        &state,
        posting_id,
        &req.name,
        &req.email,
        req.phone.as_deref(),
        req.resume_url.as_deref(),
    )
    .await?;

    let body = sonic_rs::to_string(&sonic_rs::json!({
        "id": candidate.id.to_string(),
        "message": "Application received. Good luck!",
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, body).into_response())
}
