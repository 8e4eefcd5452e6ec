use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// Per-tenant SMTP configuration. Delivery itself happens in an external
/// mailer; this service only stores the settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub tenant_id: Uuid,
    pub smtp_host: String,
    pub smtp_port: i32,
    pub smtp_username: String,
    /// Stored verbatim; masked in API responses.
    #[serde(skip_serializing)]
    pub smtp_password: String,
    pub from_address: String,
    pub from_name: String,
    pub use_tls: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for EmailSettings {
    fn from(row: &Row) -> Self {
        Self {
            tenant_id: row.get("tenant_id"),
            smtp_host: row.get("smtp_host"),
            smtp_port: row.get("smtp_port"),
            smtp_username: row.get("smtp_username"),
            smtp_password: row.get("smtp_password"),
            from_address: row.get("from_address"),
            from_name: row.get("from_name"),
            use_tls: row.get("use_tls"),
            updated_at: row.get("updated_at"),
        }
    }
}
