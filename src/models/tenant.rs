use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// The lifecycle status of a tenant account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "tenant_status")]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    #[postgres(name = "active")]
    Active,
    #[postgres(name = "suspended")]
    Suspended,
}

/// Represents a company account. All employee/leave/recruitment data is
/// scoped to a tenant, identified by its unique subdomain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// The unique identifier for the tenant.
    pub id: Uuid,
    /// The company name.
    pub name: String,
    /// The unique subdomain label (lowercase, `[a-z0-9-]+`). Immutable
    /// after registration.
    pub subdomain: String,
    /// The lifecycle status of the tenant.
    pub status: TenantStatus,
    /// The timestamp when the tenant was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the tenant was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for Tenant {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            subdomain: row.get("subdomain"),
            status: row.get("status"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
