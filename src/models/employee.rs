use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::models::session::Role;

/// Represents an employee within a tenant. Employees double as the login
/// accounts of the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// The unique identifier for the employee.
    pub id: Uuid,
    /// The tenant the employee belongs to.
    pub tenant_id: Uuid,
    /// The employee's first name.
    pub first_name: String,
    /// The employee's last name.
    pub last_name: String,
    /// The employee's email address (unique per tenant, used for login).
    pub email: String,
    /// The employee's hashed password. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password: String,
    /// The employee's role.
    pub role: Role,
    /// The employee's job title.
    pub position: Option<String>,
    /// The department the employee belongs to.
    pub department: Option<String>,
    /// The date the employee was hired.
    pub hire_date: Option<NaiveDate>,
    /// Whether the employee is active. Deactivation is the soft-delete
    /// marker; rows are never hard-deleted.
    pub is_active: bool,
    /// The timestamp when the employee was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the employee was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for Employee {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            email: row.get("email"),
            password: row.get("password"),
            role: row.get("role"),
            position: row.get("position"),
            department: row.get("department"),
            hire_date: row.get("hire_date"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
