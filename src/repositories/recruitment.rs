use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::recruitment::{Candidate, CandidateStage, JobPosting, PostingStatus},
};

const POSTING_COLUMNS: &str = "id, tenant_id, title, description, department, location, \
     employment_type, status, closes_at, created_at, updated_at";

const CANDIDATE_COLUMNS: &str = "id, tenant_id, job_posting_id, name, email, phone, resume_url, \
     stage, notes, applied_at";

/// Fields accepted when creating or replacing a job posting.
pub struct PostingInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub department: Option<&'a str>,
    pub location: Option<&'a str>,
    pub employment_type: Option<&'a str>,
    pub status: PostingStatus,
    pub closes_at: Option<DateTime<Utc>>,
}

/// Creates a job posting for a tenant.
pub async fn create_posting(pool: &Pool, tenant_id: Uuid, input: &PostingInput<'_>) -> Result<JobPosting> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                r#"
                INSERT INTO job_postings
                    (id, tenant_id, title, description, department, location, employment_type, status, closes_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {POSTING_COLUMNS}
                "#
            ),
            &[
                &Uuid::new_v4(),
                &tenant_id,
                &input.title,
                &input.description,
                &input.department,
                &input.location,
                &input.employment_type,
                &input.status,
                &input.closes_at,
            ],
        )
        .await?;
    Ok(JobPosting::from(&row))
}

/// Lists all postings of a tenant, newest first.
pub async fn list_postings(pool: &Pool, tenant_id: Uuid) -> Result<Vec<JobPosting>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &format!(
                "SELECT {POSTING_COLUMNS} FROM job_postings \
                 WHERE tenant_id = $1 ORDER BY created_at DESC"
            ),
            &[&tenant_id],
        )
        .await?;
    Ok(rows.iter().map(JobPosting::from).collect())
}

/// Finds a posting within a tenant.
pub async fn find_posting(pool: &Pool, tenant_id: Uuid, id: Uuid) -> Result<Option<JobPosting>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {POSTING_COLUMNS} FROM job_postings WHERE tenant_id = $1 AND id = $2"),
            &[&tenant_id, &id],
        )
        .await?;
    Ok(row.as_ref().map(JobPosting::from))
}

/// Replaces the mutable fields of a posting within a tenant.
pub async fn update_posting(
    pool: &Pool,
    tenant_id: Uuid,
    id: Uuid,
    input: &PostingInput<'_>,
) -> Result<Option<JobPosting>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                r#"
                UPDATE job_postings
                SET title = $3, description = $4, department = $5, location = $6,
                    employment_type = $7, status = $8, closes_at = $9, updated_at = NOW()
                WHERE tenant_id = $1 AND id = $2
                RETURNING {POSTING_COLUMNS}
                "#
            ),
            &[
                &tenant_id,
                &id,
                &input.title,
                &input.description,
                &input.department,
                &input.location,
                &input.employment_type,
                &input.status,
                &input.closes_at,
            ],
        )
        .await?;
    Ok(row.as_ref().map(JobPosting::from))
}

/// A posting joined with the advertising company's name, for the public
/// root-domain job board.
pub struct PublicPosting {
    pub posting: JobPosting,
    pub company: String,
}

/// Lists open postings across all tenants for the public job board.
pub async fn list_open_postings(pool: &Pool) -> Result<Vec<PublicPosting>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT p.id, p.tenant_id, p.title, p.description, p.department, p.location,
                   p.employment_type, p.status, p.closes_at, p.created_at, p.updated_at,
                   t.name AS company
            FROM job_postings p
            JOIN tenants t ON t.id = p.tenant_id
            WHERE p.status = 'open' AND t.status = 'active'
            ORDER BY p.created_at DESC
            "#,
            &[],
        )
        .await?;
    Ok(rows
        .iter()
        .map(|row| PublicPosting {
            posting: JobPosting::from(row),
            company: row.get("company"),
        })
        .collect())
}

/// Finds one open posting by id, regardless of tenant, for the public
/// board.
pub async fn find_open_posting(pool: &Pool, id: Uuid) -> Result<Option<PublicPosting>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT p.id, p.tenant_id, p.title, p.description, p.department, p.location,
                   p.employment_type, p.status, p.closes_at, p.created_at, p.updated_at,
                   t.name AS company
            FROM job_postings p
            JOIN tenants t ON t.id = p.tenant_id
            WHERE p.id = $1 AND p.status = 'open' AND t.status = 'active'
            "#,
            &[&id],
        )
        .await?;
    Ok(row.map(|row| PublicPosting {
        posting: JobPosting::from(&row),
        company: row.get("company"),
    }))
}

/// Creates a candidate in stage `applied` against a posting.
pub async fn create_candidate(
    pool: &Pool,
    tenant_id: Uuid,
    job_posting_id: Uuid,
    name: &str,
    email: &str,
    phone: Option<&str>,
    resume_url: Option<&str>,
) -> Result<Candidate> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                r#"
                INSERT INTO candidates (id, tenant_id, job_posting_id, name, email, phone, resume_url, stage)
                VALUES ($1, $2, $3, $4, $5, $6, $7, 'applied')
                RETURNING {CANDIDATE_COLUMNS}
                "#
            ),
            &[
                &Uuid::new_v4(),
                &tenant_id,
                &job_posting_id,
                &name,
                &email,
                &phone,
                &resume_url,
            ],
        )
        .await?;
    Ok(Candidate::from(&row))
}

/// Lists the candidates of a posting within a tenant.
pub async fn list_candidates(pool: &Pool, tenant_id: Uuid, job_posting_id: Uuid) -> Result<Vec<Candidate>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &format!(
                "SELECT {CANDIDATE_COLUMNS} FROM candidates \
                 WHERE tenant_id = $1 AND job_posting_id = $2 ORDER BY applied_at DESC"
            ),
            &[&tenant_id, &job_posting_id],
        )
        .await?;
    Ok(rows.iter().map(Candidate::from).collect())
}

/// Moves a candidate to a new pipeline stage within a tenant.
pub async fn update_candidate_stage(
    pool: &Pool,
    tenant_id: Uuid,
    candidate_id: Uuid,
    stage: CandidateStage,
    notes: Option<&str>,
) -> Result<Option<Candidate>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                r#"
                UPDATE candidates
                SET stage = $3, notes = COALESCE($4, notes)
                WHERE tenant_id = $1 AND id = $2
                RETURNING {CANDIDATE_COLUMNS}
                "#
            ),
            &[&tenant_id, &candidate_id, &stage, &notes],
        )
        .await?;
    Ok(row.as_ref().map(Candidate::from))
}

/// Closes open postings whose closing date has passed. Returns the number
/// of postings closed. Called from the background maintenance task.
pub async fn close_expired_postings(pool: &Pool) -> Result<u64> {
    let client = pool.get().await?;
    let affected = client
        .execute(
            "UPDATE job_postings SET status = 'closed', updated_at = NOW() \
             WHERE status = 'open' AND closes_at IS NOT NULL AND closes_at < NOW()",
            &[],
        )
        .await?;
    Ok(affected)
}

/// Counts open postings of a tenant.
pub async fn count_open(pool: &Pool, tenant_id: Uuid) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT COUNT(*) FROM job_postings WHERE tenant_id = $1 AND status = 'open'",
            &[&tenant_id],
        )
        .await?;
    Ok(row.get(0))
}
