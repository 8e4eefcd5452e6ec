use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role an employee (and therefore a session) acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "employee_role")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[postgres(name = "admin")]
    Admin,
    #[postgres(name = "manager")]
    Manager,
    #[postgres(name = "employee")]
    Employee,
}

impl Role {
    /// Whether this role may transition leave requests out of `Pending`.
    pub fn is_approver(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            _ => Err(()),
        }
    }
}

/// Represents an authenticated session, stored in Redis as JSON under
/// `session:{id}` and referenced by the `session_id` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The ID of the employee this session belongs to.
    pub user_id: Uuid,
    /// The tenant the session is scoped to. All write operations derive
    /// their tenant/employee identity from here, never from the client.
    pub tenant_id: Uuid,
    /// The tenant's subdomain, for building tenant-local redirects.
    pub tenant_domain: String,
    /// The role the session acts under.
    pub role: Role,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn approver_roles() {
        assert!(Role::Admin.is_approver());
        assert!(Role::Manager.is_approver());
        assert!(!Role::Employee.is_approver());
    }

    #[test]
    fn role_parses_from_lowercase() {
        assert_eq!(Role::from_str("manager"), Ok(Role::Manager));
        assert!(Role::from_str("Owner").is_err());
    }
}
