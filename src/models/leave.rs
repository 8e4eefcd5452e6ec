use chrono::{DateTime, NaiveDate, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::models::session::Role;

/// The status of a leave request.
///
/// The lifecycle is one-directional: a request is created `Pending` and
/// moves exactly once to `Approved`, `Rejected` (approver action) or
/// `Cancelled` (owner/admin action). The three latter states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "leave_status")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    #[postgres(name = "pending")]
    Pending,
    #[postgres(name = "approved")]
    Approved,
    #[postgres(name = "rejected")]
    Rejected,
    #[postgres(name = "cancelled")]
    Cancelled,
}

impl LeaveStatus {
    /// Whether no further transition is accepted from this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }

    /// Whether the state machine permits moving from `self` to `target`.
    /// Only `Pending` has outgoing edges; self-transitions are rejected.
    pub fn can_transition_to(&self, target: LeaveStatus) -> bool {
        matches!(self, LeaveStatus::Pending) && target != LeaveStatus::Pending
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for LeaveStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LeaveStatus::Pending),
            "approved" => Ok(LeaveStatus::Approved),
            "rejected" => Ok(LeaveStatus::Rejected),
            "cancelled" => Ok(LeaveStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// Checks whether `acting_role`/`acting_user` may cancel a request owned by
/// `owner`. Cancellation is reserved to the owning employee (while the
/// request is still pending) or to an admin.
pub fn may_cancel(acting_user: Uuid, acting_role: Role, owner: Uuid) -> bool {
    acting_role == Role::Admin || acting_user == owner
}

/// Static per-tenant reference data describing a category of leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveType {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    /// Whether requests of this type consume balance and require an
    /// approver to act on them.
    pub requires_approval: bool,
    /// The balance seeded for each employee, in days.
    pub default_balance: f64,
    /// Days accrued per month. Stored for reporting; no accrual scheduler
    /// runs in this service.
    pub accrual_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&Row> for LeaveType {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            name: row.get("name"),
            requires_approval: row.get("requires_approval"),
            default_balance: row.get("default_balance"),
            accrual_rate: row.get("accrual_rate"),
            created_at: row.get("created_at"),
        }
    }
}

/// An employee's request for time off against a leave type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub request_date: DateTime<Utc>,
    /// The approver who moved the request out of `Pending`, if any.
    pub approver_id: Option<Uuid>,
    pub approval_date: Option<DateTime<Utc>>,
    pub comments: Option<String>,
}

impl LeaveRequest {
    /// The number of days the request spans, inclusive of both endpoints.
    pub fn requested_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// The remaining allotment of days an employee has for a leave type.
/// Maintained by the service (seeded at employee creation, decremented on
/// approval); never directly editable by end users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub balance: f64,
    pub last_updated: DateTime<Utc>,
}

impl From<&Row> for LeaveBalance {
    fn from(row: &Row) -> Self {
        Self {
            tenant_id: row.get("tenant_id"),
            employee_id: row.get("employee_id"),
            leave_type_id: row.get("leave_type_id"),
            balance: row.get("balance"),
            last_updated: row.get("last_updated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(LeaveStatus::Cancelled.is_terminal());
    }

    #[test]
    fn only_pending_has_outgoing_transitions() {
        for target in [
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert!(LeaveStatus::Pending.can_transition_to(target));
        }

        for terminal in [
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            for target in [
                LeaveStatus::Pending,
                LeaveStatus::Approved,
                LeaveStatus::Rejected,
                LeaveStatus::Cancelled,
            ] {
                assert!(
                    !terminal.can_transition_to(target),
                    "{:?} -> {:?} must be rejected",
                    terminal,
                    target
                );
            }
        }
    }

    #[test]
    fn no_transition_back_into_pending() {
        assert!(!LeaveStatus::Pending.can_transition_to(LeaveStatus::Pending));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert_eq!(LeaveStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(LeaveStatus::from_str("Pending").is_err());
    }

    #[test]
    fn cancellation_is_owner_or_admin() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(may_cancel(owner, Role::Employee, owner));
        assert!(may_cancel(other, Role::Admin, owner));
        assert!(!may_cancel(other, Role::Employee, owner));
        assert!(!may_cancel(other, Role::Manager, owner));
    }

    #[test]
    fn requested_days_is_inclusive() {
        let request = LeaveRequest {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            leave_type_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 6).unwrap(),
            reason: "Family trip".to_string(),
            status: LeaveStatus::Pending,
            request_date: Utc::now(),
            approver_id: None,
            approval_date: None,
            comments: None,
        };
        assert_eq!(request.requested_days(), 5);

        let single_day = LeaveRequest {
            end_date: request.start_date,
            ..request
        };
        assert_eq!(single_day.requested_days(), 1);
    }
}
