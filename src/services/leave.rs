use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::leave::{self, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType},
    models::session::Session,
    repositories::leave as leave_repo,
    state::AppState,
    validation,
};

/// Creates a leave request for the acting employee.
///
/// The employee and tenant identity come exclusively from the session;
/// client-supplied ids are never trusted for writes. The balance check and
/// the insert run atomically in the repository.
pub async fn create_request(
    state: &AppState,
    session: &Session,
    leave_type_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: &str,
) -> Result<LeaveRequest> {
    validation::leave::validate_date_range(start_date, end_date)?;
    validation::leave::validate_reason(reason)?;

    let request = leave_repo::create_request_atomic(
        &state.db,
        session.tenant_id,
        session.user_id,
        leave_type_id,
        start_date,
        end_date,
        reason.trim(),
    )
    .await?;

    tracing::info!(
        "✅ Leave request {} created for employee {} ({} day(s))",
        request.id,
        request.employee_id,
        request.requested_days()
    );
    Ok(request)
}

/// Lists leave requests visible to the acting session.
///
/// Strictly tenant-scoped. A non-approver's view is forced to their own
/// requests regardless of the requested employee filter; this is an
/// authorization rule, not a convenience default.
pub async fn list_requests(
    state: &AppState,
    session: &Session,
    employee_id: Option<Uuid>,
    status: Option<LeaveStatus>,
) -> Result<Vec<LeaveRequest>> {
    let effective_employee = if session.role.is_approver() {
        employee_id
    } else {
        Some(session.user_id)
    };

    leave_repo::list_requests(&state.db, session.tenant_id, effective_employee, status).await
}

/// Approves or rejects a pending request.
///
/// Only approver roles may call this; the target status must be one of the
/// two approver outcomes, and the request must still be `Pending` at write
/// time (conditional update in the repository).
pub async fn update_status(
    state: &AppState,
    session: &Session,
    request_id: Uuid,
    new_status: LeaveStatus,
    comments: Option<&str>,
) -> Result<LeaveRequest> {
    if !session.role.is_approver() {
        return Err(AppError::Unauthorized);
    }

    if !matches!(new_status, LeaveStatus::Approved | LeaveStatus::Rejected) {
        return Err(AppError::Validation(
            "Status must be 'approved' or 'rejected'".to_string(),
        ));
    }

    let request = leave_repo::update_status_if_pending(
        &state.db,
        session.tenant_id,
        request_id,
        new_status,
        session.user_id,
        comments,
    )
    .await?;

    tracing::info!(
        "✅ Leave request {} {} by {}",
        request.id,
        request.status.as_str(),
        session.user_id
    );
    Ok(request)
}

/// Cancels a pending request. Allowed for the owning employee while the
/// request is still `Pending`, or for an admin.
pub async fn cancel(state: &AppState, session: &Session, request_id: Uuid) -> Result<LeaveRequest> {
    let request = leave_repo::find_request(&state.db, session.tenant_id, request_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !leave::may_cancel(session.user_id, session.role, request.employee_id) {
        return Err(AppError::Unauthorized);
    }

    if request.status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "Request is already {}",
            request.status.as_str()
        )));
    }

    let cancelled = leave_repo::cancel_if_pending(&state.db, session.tenant_id, request_id).await?;
    tracing::info!("✅ Leave request {} cancelled by {}", request_id, session.user_id);
    Ok(cancelled)
}

/// Lists the leave types of the session's tenant.
pub async fn list_types(state: &AppState, session: &Session) -> Result<Vec<LeaveType>> {
    leave_repo::list_types(&state.db, session.tenant_id).await
}

/// Creates a leave type. Admin only.
pub async fn create_type(
    state: &AppState,
    session: &Session,
    name: &str,
    requires_approval: bool,
    default_balance: f64,
    accrual_rate: f64,
) -> Result<LeaveType> {
    if session.role != crate::models::session::Role::Admin {
        return Err(AppError::Unauthorized);
    }
    if default_balance < 0.0 || accrual_rate < 0.0 {
        return Err(AppError::Validation(
            "Balance and accrual rate must not be negative".to_string(),
        ));
    }
    crate::validation::auth::validate_name(name, "Leave type name")?;

    leave_repo::create_type(
        &state.db,
        session.tenant_id,
        name.trim(),
        requires_approval,
        default_balance,
        accrual_rate,
    )
    .await
}

/// Lists leave balances. Employees see their own; approvers may inspect
/// any employee of the tenant.
pub async fn list_balances(
    state: &AppState,
    session: &Session,
    employee_id: Option<Uuid>,
) -> Result<Vec<LeaveBalance>> {
    let target = match employee_id {
        Some(id) if session.role.is_approver() => id,
        Some(id) if id != session.user_id => return Err(AppError::Unauthorized),
        _ => session.user_id,
    };

    leave_repo::list_balances(&state.db, session.tenant_id, target).await
}
