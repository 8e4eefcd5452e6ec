use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};

use crate::{
    error::{AppError, Result},
    models::{session::Session, tenant::Tenant},
    repositories::{employee as employee_repo, leave as leave_repo, recruitment as recruitment_repo},
    state::AppState,
};

/// The tenant dashboard summary. This is the rewrite target the resolver
/// sends an authenticated subdomain-root request to.
#[axum::debug_handler]
pub async fn summary(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(tenant): Extension<Tenant>,
    Path(subdomain): Path<String>,
) -> Result<Response> {
    // The path prefix comes from the resolver; a hand-crafted path naming
    // another tenant must not leak anything.
    if subdomain != tenant.subdomain {
        return Err(AppError::Unauthorized);
    }

    let headcount = employee_repo::count_active(&state.db, tenant.id).await?;
    let pending_leave = leave_repo::count_pending(&state.db, tenant.id).await?;
    let open_postings = recruitment_repo::count_open(&state.db, tenant.id).await?;

    let body = sonic_rs::to_string(&sonic_rs::json!({
        "tenant": {
            "name": tenant.name,
            "subdomain": tenant.subdomain,
        },
        "headcount": headcount,
        "pending_leave_requests": pending_leave,
        "open_postings": open_postings,
        "role": session.role,
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, body).into_response())
}
