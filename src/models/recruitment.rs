use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// The publication status of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "posting_status")]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    #[postgres(name = "draft")]
    Draft,
    #[postgres(name = "open")]
    Open,
    #[postgres(name = "closed")]
    Closed,
}

impl std::str::FromStr for PostingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostingStatus::Draft),
            "open" => Ok(PostingStatus::Open),
            "closed" => Ok(PostingStatus::Closed),
            _ => Err(()),
        }
    }
}

/// The pipeline stage a candidate sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "candidate_stage")]
#[serde(rename_all = "lowercase")]
pub enum CandidateStage {
    #[postgres(name = "applied")]
    Applied,
    #[postgres(name = "screening")]
    Screening,
    #[postgres(name = "interview")]
    Interview,
    #[postgres(name = "offer")]
    Offer,
    #[postgres(name = "hired")]
    Hired,
    #[postgres(name = "rejected")]
    Rejected,
}

impl std::str::FromStr for CandidateStage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(CandidateStage::Applied),
            "screening" => Ok(CandidateStage::Screening),
            "interview" => Ok(CandidateStage::Interview),
            "offer" => Ok(CandidateStage::Offer),
            "hired" => Ok(CandidateStage::Hired),
            "rejected" => Ok(CandidateStage::Rejected),
            _ => Err(()),
        }
    }
}

/// A job opening advertised by a tenant. Open postings are visible on the
/// public root-domain job board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub status: PostingStatus,
    /// When set, the posting is closed automatically once this passes.
    pub closes_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for JobPosting {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            title: row.get("title"),
            description: row.get("description"),
            department: row.get("department"),
            location: row.get("location"),
            employment_type: row.get("employment_type"),
            status: row.get("status"),
            closes_at: row.get("closes_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// An applicant attached to a job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub job_posting_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub stage: CandidateStage,
    pub notes: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl From<&Row> for Candidate {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            job_posting_id: row.get("job_posting_id"),
            name: row.get("name"),
            email: row.get("email"),
            phone: row.get("phone"),
            resume_url: row.get("resume_url"),
            stage: row.get("stage"),
            notes: row.get("notes"),
            applied_at: row.get("applied_at"),
        }
    }
}
