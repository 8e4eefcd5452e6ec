use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::recruitment::{Candidate, CandidateStage, JobPosting},
    models::session::Session,
    repositories::recruitment as recruitment_repo,
    state::AppState,
    validation,
};

pub use recruitment_repo::{PostingInput, PublicPosting};

/// Creates a job posting. Approver roles only.
pub async fn create_posting(
    state: &AppState,
    session: &Session,
    input: &PostingInput<'_>,
) -> Result<JobPosting> {
    if !session.role.is_approver() {
        return Err(AppError::Unauthorized);
    }
    validation::auth::validate_name(input.title, "Title")?;

    recruitment_repo::create_posting(&state.db, session.tenant_id, input).await
}

/// Lists all postings of the session's tenant.
pub async fn list_postings(state: &AppState, session: &Session) -> Result<Vec<JobPosting>> {
    recruitment_repo::list_postings(&state.db, session.tenant_id).await
}

/// Fetches one posting of the session's tenant.
pub async fn get_posting(state: &AppState, session: &Session, id: Uuid) -> Result<JobPosting> {
    recruitment_repo::find_posting(&state.db, session.tenant_id, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Replaces a posting's mutable fields. Approver roles only.
pub async fn update_posting(
    state: &AppState,
    session: &Session,
    id: Uuid,
    input: &PostingInput<'_>,
) -> Result<JobPosting> {
    if !session.role.is_approver() {
        return Err(AppError::Unauthorized);
    }
    validation::auth::validate_name(input.title, "Title")?;

    recruitment_repo::update_posting(&state.db, session.tenant_id, id, input)
        .await?
        .ok_or(AppError::NotFound)
}

/// Lists the candidates of a posting. Approver roles only.
pub async fn list_candidates(
    state: &AppState,
    session: &Session,
    posting_id: Uuid,
) -> Result<Vec<Candidate>> {
    if !session.role.is_approver() {
        return Err(AppError::Unauthorized);
    }

    // 404 rather than an empty list when the posting is not in this tenant.
    recruitment_repo::find_posting(&state.db, session.tenant_id, posting_id)
        .await?
        .ok_or(AppError::NotFound)?;

    recruitment_repo::list_candidates(&state.db, session.tenant_id, posting_id).await
}

/// Moves a candidate to a new pipeline stage. Approver roles only.
pub async fn update_candidate_stage(
    state: &AppState,
    session: &Session,
    candidate_id: Uuid,
    stage: CandidateStage,
    notes: Option<&str>,
) -> Result<Candidate> {
    if !session.role.is_approver() {
        return Err(AppError::Unauthorized);
    }

    recruitment_repo::update_candidate_stage(&state.db, session.tenant_id, candidate_id, stage, notes)
        .await?
        .ok_or(AppError::NotFound)
}

/// Lists open postings for the public root-domain job board.
pub async fn list_public_postings(state: &AppState) -> Result<Vec<PublicPosting>> {
    recruitment_repo::list_open_postings(&state.db).await
}

/// Fetches one open posting for the public board.
pub async fn get_public_posting(state: &AppState, id: Uuid) -> Result<PublicPosting> {
    recruitment_repo::find_open_posting(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Records a public application against an open posting. The candidate
/// lands in the posting's tenant in stage `applied`.
pub async fn apply(
    state: &AppState,
    posting_id: Uuid,
    name: &str,
    email: &str,
    phone: Option<&str>,
    resume_url: Option<&str>,
) -> Result<Candidate> {
    validation::auth::validate_name(name, "Name")?;
    validation::auth::validate_email(email)?;

    let posting = get_public_posting(state, posting_id).await?;

    let candidate = recruitment_repo::create_candidate(
        &state.db,
        posting.posting.tenant_id,
        posting_id,
        name.trim(),
        email,
        phone,
        resume_url,
    )
    .await?;

    tracing::info!(
        "✅ Application received for posting {} ({})",
        posting_id,
        posting.posting.title
    );
    Ok(candidate)
}
